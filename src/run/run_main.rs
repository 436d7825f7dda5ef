use crate::convert::{convert_markdown, ConvertError, ConvertOptions};
use crate::job::{process_item, Item, ItemError, PublishedItem};
use crate::normalize::normalize;
use crate::outline::ToggleStructure;
use crate::publish::{DryRunRequest, DryRunStore};
use crate::run::cli::{OutputFormat, PLACEHOLDER_PAGE_ID};
use crate::run::RunOptions;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::{env, io};

/// The run's overall possible error.
#[derive(Debug)]
pub enum Error {
    /// The Markdown couldn't be converted into blocks.
    ///
    /// This comes from [`convert_markdown`].
    Convert(ConvertError),

    /// The dry-run publish failed: bad page id, empty document, or a conversion failure along the way.
    ///
    /// This comes from [`process_item`].
    Item(ItemError),

    /// Couldn't read an input file.
    FileReadError(Input, io::Error),

    /// Couldn't write the output.
    Output(String),
}

impl std::error::Error for Error {}

/// Stdin or an input file by path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Input {
    Stdin,
    FilePath(String),
}

impl Error {
    pub(crate) fn from_io_error(error: io::Error, file: Input) -> Self {
        Error::FileReadError(file, error)
    }
}

impl Display for Input {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Stdin => f.write_str("stdin"),
            Input::FilePath(file) => write!(f, "file {file:?}"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Convert(err) => {
                writeln!(f, "Markdown conversion error:")?;
                writeln!(f, "{err}")
            }
            Error::Item(err) => writeln!(f, "{err}"),
            Error::FileReadError(file, err) => {
                if env::var("MD2NOTION_PORTABLE_ERRORS").unwrap_or_default().is_empty() {
                    writeln!(f, "{err} while reading {file}")
                } else {
                    writeln!(f, "{} while reading {file}", err.kind())
                }
            }
            Error::Output(err) => writeln!(f, "couldn't write output: {err}"),
        }
    }
}

/// A simple facade for handling I/O.
///
/// This trait lets you do "I/O-y stuff" like mocking out stdin or reading files. The [`run`] method uses it.
pub trait OsFacade {
    /// Read stdin (or your mock of it) to a `String`.
    fn read_stdin(&self) -> io::Result<String>;

    /// Read a file path (or your mock of one) to a `String`.
    fn read_file(&self, path: &str) -> io::Result<String>;

    /// Get a writer for stdout (or your mock of it).
    fn stdout(&mut self) -> impl Write;

    /// Handle an error.
    fn write_error(&mut self, err: Error);

    /// Read a slice of file paths into a single, concatenated `String`.
    ///
    /// The default implementation (which you should feel free to use) treats the file path `"-"` as stdin. The first
    /// `"-"` reads all of stdin (via [`Self::read_stdin`]), and subsequent `"-"`s get silently ignored.
    fn read_all(&self, markdown_file_paths: &[String]) -> Result<String, Error> {
        if markdown_file_paths.is_empty() {
            return self.read_stdin().map_err(|err| Error::from_io_error(err, Input::Stdin));
        }
        let mut contents = String::new();
        let mut have_read_stdin = false;
        for path in markdown_file_paths {
            if path == "-" {
                if !have_read_stdin {
                    contents.push_str(
                        &self
                            .read_stdin()
                            .map_err(|err| Error::from_io_error(err, Input::Stdin))?,
                    );
                    have_read_stdin = true
                }
            } else {
                let path_contents = self
                    .read_file(path)
                    .map_err(|err| Error::from_io_error(err, Input::FilePath(path.to_string())))?;
                contents.push_str(&path_contents);
            }
            contents.push('\n');
        }
        Ok(contents)
    }
}

/// What `--output plan` prints.
#[derive(Serialize)]
struct Plan<'a> {
    result: PublishedItem,
    requests: &'a [DryRunRequest],
}

/// Runs md2notion end to end.
///
/// This uses the provided [RunOptions] and [OsFacade] to read the Markdown, convert it into blocks, and write them to
/// the given [`OsFacade`] in the format specified by [`RunOptions::output`]. Nothing is sent anywhere: the `plan`
/// output publishes into a [`DryRunStore`].
///
/// Returns whether the run succeeded. On failure, the error has already gone to [`OsFacade::write_error`].
pub fn run(cli: &RunOptions, os: &mut impl OsFacade) -> bool {
    match run_or_error(cli, os) {
        Ok(()) => true,
        Err(err) => {
            os.write_error(err);
            false
        }
    }
}

fn run_or_error(cli: &RunOptions, os: &mut impl OsFacade) -> Result<(), Error> {
    let contents_str = os.read_all(&cli.markdown_file_paths)?;
    let options: ConvertOptions = cli.into();

    match cli.output {
        OutputFormat::Blocks => {
            let blocks = convert_markdown(&contents_str, &options).map_err(Error::Convert)?;
            let normalized = normalize(blocks);
            write_json(cli, os, &normalized.blocks)
        }
        OutputFormat::Outline => {
            let blocks = convert_markdown(&contents_str, &options).map_err(Error::Convert)?;
            let structure = ToggleStructure::build(normalize(blocks).blocks);
            write_json(cli, os, &structure)
        }
        OutputFormat::Plan => {
            let page_id = cli.page_id.as_deref().unwrap_or(PLACEHOLDER_PAGE_ID);
            let item = Item::new(page_id, contents_str, options);
            let mut store = DryRunStore::default();
            let result = process_item(&item, &mut store).map_err(Error::Item)?;
            let plan = Plan {
                result,
                requests: store.requests(),
            };
            write_json(cli, os, &plan)
        }
    }
}

fn write_json(cli: &RunOptions, os: &mut impl OsFacade, value: &impl Serialize) -> Result<(), Error> {
    if cli.quiet {
        return Ok(());
    }
    let mut stdout = os.stdout();
    serde_json::to_writer(&mut stdout, value).map_err(|err| Error::Output(err.to_string()))?;
    writeln!(stdout).map_err(|err| Error::Output(err.to_string()))
}
