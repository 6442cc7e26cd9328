use rcex::{FailFastWriter, OutputRecord};
use std::io::{self, Write};

/// Rejects the first write it sees, then accepts everything.
#[derive(Default)]
struct FlakyOnce {
    rejected: bool,
    data: Vec<u8>,
}

impl Write for FlakyOnce {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.rejected {
            self.rejected = true;
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn row(id: &str, body: String) -> OutputRecord {
    OutputRecord { timestamp: "t".into(), comment_id: id.into(), comment_body: body, parent_text: "p".into() }
}

/// A record that fails half-way through leaves a partial record in the CSV
/// buffer. Once the writer has failed, neither later rows, explicit flushes
/// nor the drop-time flush may reach the underlying file.
#[test]
fn failed_write_latches_the_output() {
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(FailFastWriter::new(FlakyOnce::default()));

    // Larger than the CSV writer's buffer, so the write reaches the file mid-record.
    assert!(row("c1", "x".repeat(64 * 1024)).write_to(&mut w).is_err());
    assert!(w.get_ref().has_failed());

    assert!(row("c2", "small".into()).write_to(&mut w).is_err());
    assert!(w.flush().is_err());
    assert!(w.get_ref().get_ref().data.is_empty());
}

/// A healthy writer passes rows straight through.
#[test]
fn healthy_writer_passes_rows_through() {
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(FailFastWriter::new(Vec::new()));
    row("c1", "body".into()).write_to(&mut w).unwrap();
    w.flush().unwrap();

    assert!(!w.get_ref().has_failed());
    assert_eq!(String::from_utf8_lossy(w.get_ref().get_ref()).trim_end(), "t,c1,body,p");
}
