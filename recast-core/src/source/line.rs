use super::handshake::{Handshake, HandshakeOptions, UnitProducer};
use super::ContentSource;
use crate::error::{RefactorError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Streams a file line by line without parsing it.
///
/// Units are line contents without their terminator. Each line keeps the
/// terminator it was read with (`\n`, `\r\n`, or nothing on a final
/// unterminated line), so a rule that changes nothing leaves the file
/// byte-identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSource;

impl LineSource {
    pub fn new() -> Self {
        Self
    }
}

impl ContentSource for LineSource {
    fn kind(&self) -> &'static str {
        "line"
    }

    fn initiate(&self, path: &Path, options: &HandshakeOptions) -> Result<Handshake> {
        // The file is opened by the worker; open failures close the stream
        // and come back as the cycle's outcome.
        Ok(Handshake::spawn(path, LineProducer::new(path), options))
    }
}

struct LineProducer {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    terminator: &'static str,
    output: String,
}

impl LineProducer {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            reader: None,
            terminator: "",
            output: String::new(),
        }
    }

    fn open(&self) -> Result<BufReader<File>> {
        let file = File::open(&self.path).map_err(|e| RefactorError::read(&self.path, e))?;
        let mut reader = BufReader::new(file);

        let head = reader
            .fill_buf()
            .map_err(|e| RefactorError::read(&self.path, e))?;
        if content_inspector::inspect(head).is_binary() {
            return Err(RefactorError::BinaryContent {
                path: self.path.clone(),
            });
        }

        Ok(reader)
    }
}

impl UnitProducer for LineProducer {
    fn next_unit(&mut self) -> Result<Option<String>> {
        if self.reader.is_none() {
            self.reader = Some(self.open()?);
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| RefactorError::read(&self.path, e))?;
        if read == 0 {
            return Ok(None);
        }

        self.terminator = if line.ends_with("\r\n") {
            "\r\n"
        } else if line.ends_with('\n') {
            "\n"
        } else {
            ""
        };
        line.truncate(line.len() - self.terminator.len());

        Ok(Some(line))
    }

    fn accept(&mut self, replacement: String) -> Result<()> {
        self.output.push_str(&replacement);
        self.output.push_str(self.terminator);
        Ok(())
    }

    fn finish(self) -> Result<String> {
        Ok(self.output)
    }
}
