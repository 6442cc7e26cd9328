#![allow(dead_code)]

use rcex::{ApiError, CommentData, RedditApi, SubmissionData};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Scripted, in-memory stand-in for the Reddit API.
/// - `comment(id, body)` / `submission(id, title, selftext)` register things.
/// - `fail(fullname, err)` queues an error returned (once) before normal lookup.
/// - Every lookup is recorded as `t1_<id>` / `t3_<id>` in `calls`.
/// - `on_call` runs before each lookup (handy for observing disk state mid-run).
#[derive(Default)]
pub struct FakeReddit {
    comments: HashMap<String, String>,
    submissions: HashMap<String, (String, String)>,
    failures: RefCell<HashMap<String, VecDeque<ApiError>>>,
    calls: RefCell<Vec<String>>,
    on_call: Option<Box<dyn Fn(&str)>>,
}

impl FakeReddit {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn comment(mut self, id: &str, body: &str) -> Self {
        self.comments.insert(id.to_string(), body.to_string());
        self
    }
    pub fn submission(mut self, id: &str, title: &str, selftext: &str) -> Self {
        self.submissions.insert(id.to_string(), (title.to_string(), selftext.to_string()));
        self
    }
    pub fn fail(self, fullname: &str, err: ApiError) -> Self {
        self.failures.borrow_mut().entry(fullname.to_string()).or_default().push_back(err);
        self
    }
    pub fn on_call(mut self, f: impl Fn(&str) + 'static) -> Self {
        self.on_call = Some(Box::new(f));
        self
    }
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, fullname: &str) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(fullname.to_string());
        if let Some(f) = &self.on_call {
            f(fullname);
        }
        let queued = self.failures.borrow_mut().get_mut(fullname).and_then(|q| q.pop_front());
        match queued {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl RedditApi for FakeReddit {
    fn fetch_comment(&self, id: &str) -> Result<CommentData, ApiError> {
        self.record(&format!("t1_{id}"))?;
        self.comments
            .get(id)
            .map(|body| CommentData { id: id.to_string(), body: body.clone() })
            .ok_or_else(|| ApiError::NotFound { kind: "comment", id: id.to_string() })
    }

    fn fetch_submission(&self, id: &str) -> Result<SubmissionData, ApiError> {
        self.record(&format!("t3_{id}"))?;
        self.submissions
            .get(id)
            .map(|(title, selftext)| SubmissionData {
                id: id.to_string(),
                title: title.clone(),
                selftext: selftext.clone(),
            })
            .ok_or_else(|| ApiError::NotFound { kind: "submission", id: id.to_string() })
    }
}

/// Fresh scratch directory (kept alive by the caller's `TempDir`).
pub fn scratch() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Write an input CSV with the given header and rows (properly quoted).
pub fn write_input(dir: &Path, header: &[&str], rows: &[Vec<&str>]) -> PathBuf {
    let path = dir.join("comments.csv");
    let mut w = csv::Writer::from_writer(File::create(&path).unwrap());
    w.write_record(header).unwrap();
    for r in rows {
        w.write_record(r).unwrap();
    }
    w.flush().unwrap();
    path
}

/// Input with the standard `id, body, date, parent` columns; `n` rows
/// `c1..cn` each replying to comment `p1..pn`.
pub fn write_numbered_input(dir: &Path, n: usize) -> PathBuf {
    let rows: Vec<Vec<String>> = (1..=n)
        .map(|i| vec![format!("c{i}"), format!("body {i}"), format!("2021-01-{i:02}"), format!("t1_p{i}")])
        .collect();
    let borrowed: Vec<Vec<&str>> = rows.iter().map(|r| r.iter().map(String::as_str).collect()).collect();
    write_input(dir, &["id", "body", "date", "parent"], &borrowed)
}

/// A fake that knows parent comments `p1..pn`.
pub fn numbered_parents(n: usize) -> FakeReddit {
    (1..=n).fold(FakeReddit::new(), |f, i| f.comment(&format!("p{i}"), &format!("parent {i}")))
}

/// Data rows of an output CSV (header excluded).
pub fn read_output_rows(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path).unwrap();
    rdr.records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

pub fn output_ids(path: &Path) -> Vec<String> {
    read_output_rows(path).into_iter().map(|r| r[1].clone()).collect()
}

pub fn read_bytes(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}
