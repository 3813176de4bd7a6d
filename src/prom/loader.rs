use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use reqwest::blocking::Client;
use reqwest::StatusCode;

use super::extractor::Extractor;
use super::parser::{LineError, Parser};
use super::reporter::{LogReporter, Reporter};

/// Errors produced while building an [`Extractor`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to query metrics endpoint {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("metrics endpoint {url} responded with status code != 200: {status}")]
    Status { url: String, status: u16 },
    #[error("failed to open metrics file {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read exposition text")]
    Read(#[source] io::Error),
    #[error(transparent)]
    Parse(#[from] LineError),
}

/// Builds extractors from an HTTP endpoint, a file or any reader.
///
/// Every call produces an independent snapshot; nothing is cached. The HTTP
/// client is only built on the first [`Loader::fetch`], so file and reader
/// loading never start one.
#[derive(Debug, Clone)]
pub struct Loader {
    client: OnceLock<Client>,
    reporter: Arc<dyn Reporter>,
}

impl Default for Loader {
    fn default() -> Self {
        Loader::with_reporter(Arc::new(LogReporter))
    }
}

impl Loader {
    pub fn new(client: Client, reporter: Arc<dyn Reporter>) -> Self {
        Loader {
            client: OnceLock::from(client),
            reporter,
        }
    }

    pub fn with_reporter(reporter: Arc<dyn Reporter>) -> Self {
        Loader {
            client: OnceLock::new(),
            reporter,
        }
    }

    fn client(&self, url: &str) -> Result<&Client, Error> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .build()
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(self.client.get_or_init(|| client))
    }

    /// Scrape `url` once. Anything but a 200 response is an error.
    pub fn fetch(&self, url: &str) -> Result<Extractor, Error> {
        self.fetch_inner(url)
            .inspect_err(|e| self.reporter.load_failed(url, e))
    }

    fn fetch_inner(&self, url: &str) -> Result<Extractor, Error> {
        log::debug!("scraping metrics from {url}");
        let response = self
            .client(url)?
            .get(url)
            .send()
            .map_err(|source| Error::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // the response owns the connection; dropping it on any path releases it
        self.decode(response)
    }

    /// Decode the exposition file at `path`.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Extractor, Error> {
        let path = path.as_ref();
        self.open_inner(path)
            .inspect_err(|e| self.reporter.load_failed(&path.display().to_string(), e))
    }

    fn open_inner(&self, path: &Path) -> Result<Extractor, Error> {
        log::debug!("reading metrics from {}", path.display());
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode(BufReader::new(file))
    }

    /// Decode exposition text from an arbitrary reader.
    pub fn read(&self, reader: impl Read) -> Result<Extractor, Error> {
        self.decode(reader)
            .inspect_err(|e| self.reporter.load_failed("reader", e))
    }

    fn decode(&self, mut reader: impl Read) -> Result<Extractor, Error> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(Error::Read)?;
        drop(reader);

        let snapshot = Parser::new().parse_text(&text)?;
        log::debug!("decoded {} metric families", snapshot.len());
        Ok(Extractor::with_reporter(snapshot, self.reporter.clone()))
    }
}
