use std::io::Write;
use std::path::Path;

use trawl_fs::AtomicFile;
use trawl_store::StagingStore;

use crate::{ArrayStyle, Error, Format, OutputEncoding, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerateSummary {
    pub records: usize,
    pub bytes:   u64,
}

/// Builds the delivery artifact from everything in a staging store.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    format:   Format,
    style:    ArrayStyle,
    encoding: OutputEncoding,
}

impl Aggregator {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn style(mut self, style: ArrayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Write the artifact to `output`, replacing any previous file only on success.
    pub fn generate<S: StagingStore + ?Sized>(&self, store: &S, output: impl AsRef<Path>) -> Result<GenerateSummary> {
        let output = output.as_ref();
        let mut file = AtomicFile::create(output)?;
        let summary = self.write_to(store, &mut file)?;
        file.commit()?;
        tracing::info!(
            path = %output.display(),
            records = summary.records,
            bytes = summary.bytes,
            format = %self.format,
            encoding = %self.encoding,
            "artifact written"
        );
        Ok(summary)
    }

    /// Stream the framed, transcoded records into `out`.
    pub fn write_to<S: StagingStore + ?Sized, W: Write>(&self, store: &S, out: &mut W) -> Result<GenerateSummary> {
        let formatter = self.format.formatter(self.style);
        let mut sink = Sink {
            out,
            encoding: self.encoding,
            bytes: 0,
        };

        sink.text(formatter.open(), || "array opening".to_string())?;
        let mut records = 0;
        for record in store.list_all()? {
            let record = record?;
            let text = OutputEncoding::decode_utf8(&record.payload)
                .ok_or_else(|| Error::InvalidStagedText { id: record.id.clone() })?;

            sink.text(formatter.before(records), String::new)?;
            sink.text(&text, || format!("staged record {}", record.id))?;
            sink.text(formatter.after(records), String::new)?;
            records += 1;
        }
        sink.text(formatter.close(), String::new)?;
        sink.out.flush().map_err(Error::Write)?;

        Ok(GenerateSummary {
            records,
            bytes: sink.bytes,
        })
    }
}

struct Sink<'a, W> {
    out:      &'a mut W,
    encoding: OutputEncoding,
    bytes:    u64,
}

impl<W: Write> Sink<'_, W> {
    fn text(&mut self, text: &str, context: impl FnOnce() -> String) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let bytes = self.encoding.encode(text, context)?;
        self.out.write_all(&bytes).map_err(Error::Write)?;
        self.bytes += bytes.len() as u64;
        Ok(())
    }
}
