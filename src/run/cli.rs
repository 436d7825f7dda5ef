use crate::convert::ConvertOptions;
use clap::{Parser, ValueEnum};
use derive_builder::Builder;
use std::fmt::{Display, Formatter};

/// A page id that passes validation, for runs that don't publish anywhere real.
pub const PLACEHOLDER_PAGE_ID: &str = "00000000000000000000000000000000";

macro_rules! create_options_structs {
    (
        $(
            $(#[$meta:meta])*
            clap $clap:tt
            pub $name:ident : $ty:ty
        ),* $(,)?
    ) => {
        #[derive(Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Parser)]
        #[command(version, about, long_about = None)]
        #[doc(hidden)]
        pub struct CliOptions {
            $(
            $(#[$meta])*
            #[arg$clap]
            pub(crate) $name: $ty,
            )*

            /// An optional list of Markdown files to convert, by path. If not provided, standard input will be used.
            ///
            /// If these are provided, md2notion will act as if they were all concatenated into a single file.
            ///
            /// A path of "-" represents standard input. All but the first "-" are ignored.
            #[arg()]
            pub(crate) markdown_file_paths: Vec<String>,
        }

        /// Options analogous to the md2notion CLI's switches.
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Builder)]
        pub struct RunOptions {
            $(
            $(#[$meta])*
            pub $name: $ty,
            )*

            pub markdown_file_paths: Vec<String>
        }

        impl From<CliOptions> for RunOptions {
            fn from(value: CliOptions) -> Self {
                Self {
                    $($name: value.$name,)*
                    markdown_file_paths: value.markdown_file_paths,
                }
            }
        }
    };
}

create_options_structs! {
    /// Publish as a collapsible outline: each heading becomes a toggle that holds the content under it.
    clap(long)
    pub toggle_headings: bool,

    /// Hide delimited math from the markdown parser, so formulas come through verbatim.
    clap(long, default_value_t = true, action = clap::ArgAction::Set)
    pub preserve_math: bool,

    /// The inline math delimiter.
    clap(long, default_value_t = String::from("$"))
    pub math_delimiter: String,

    /// Also recognize $$...$$, \[...\] and \(...\), and emit math as equations instead of text.
    clap(long)
    pub support_latex: bool,

    /// Specifies the output format. Defaults to blocks.
    clap(long, short, default_value_t = OutputFormat::Blocks)
    pub output: OutputFormat,

    /// The target page, for the plan output. Defaults to a placeholder id.
    clap(long)
    pub page_id: Option<String>,

    /// Quiet: do not print anything to stdout. The exit code will still be 0 on success, and non-0 on failure.
    clap(long, short)
    pub quiet: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            toggle_headings: false,
            preserve_math: true,
            math_delimiter: "$".to_string(),
            support_latex: false,
            output: OutputFormat::Blocks,
            page_id: None,
            quiet: false,
            markdown_file_paths: vec![],
        }
    }
}

impl From<&RunOptions> for ConvertOptions {
    fn from(cli: &RunOptions) -> Self {
        ConvertOptions {
            preserve_math: cli.preserve_math,
            math_delimiter: cli.math_delimiter.clone(),
            support_latex: cli.support_latex,
            toggle_headings: cli.toggle_headings,
        }
    }
}

/// Output formats, analogous to `--output` in the CLI.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum OutputFormat {
    /// The normalized blocks, as the JSON array they'd be sent as.
    Blocks,

    /// The heading tree that collapsible-outline mode publishes: `rootNodes` and `orphanBlocks`.
    Outline,

    /// A dry-run publish: the result the host would get, plus every request that would be made (parent id and
    /// child count). Compare with and without --toggle-headings to see the request cost of outline mode.
    Plan,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Blocks
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let self_str = match self {
            OutputFormat::Blocks => "blocks",
            OutputFormat::Outline => "outline",
            OutputFormat::Plan => "plan",
        };
        f.write_str(self_str)
    }
}

#[cfg(test)]
mod tests {
    use crate::convert::ConvertOptions;
    use crate::run::cli::{CliOptions, OutputFormat};
    use crate::run::{RunOptions, RunOptionsBuilder};
    use crate::util::utils_for_test::*;
    use clap::{Error, Parser};

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        CliOptions::command().debug_assert();
    }

    #[test]
    fn no_args() {
        let result = CliOptions::try_parse_from(["md2notion"]);
        unwrap!(result, Ok(cli));
        assert!(cli.markdown_file_paths.is_empty());
        let run_opts: RunOptions = cli.into();
        assert_eq!(run_opts.output, OutputFormat::Blocks);
    }

    #[test]
    fn no_args_equals_default() {
        let result = CliOptions::try_parse_from(["md2notion"]);
        unwrap!(result, Ok(cli));
        let from_cli: RunOptions = cli.into();
        assert_eq!(from_cli, RunOptions::default());
    }

    #[test]
    fn default_convert_options_match() {
        let convert: ConvertOptions = (&RunOptions::default()).into();
        assert_eq!(convert, ConvertOptions::default());
    }

    #[test]
    fn all_switches() {
        let result = CliOptions::try_parse_from([
            "md2notion",
            "--toggle-headings",
            "--preserve-math",
            "false",
            "--math-delimiter",
            "%",
            "--support-latex",
            "-o",
            "plan",
            "--page-id",
            "abc",
            "-q",
            "a.md",
            "-",
        ]);
        unwrap!(result, Ok(cli));
        let run_opts: RunOptions = cli.into();
        let expected = RunOptionsBuilder::default()
            .toggle_headings(true)
            .preserve_math(false)
            .math_delimiter("%".to_string())
            .support_latex(true)
            .output(OutputFormat::Plan)
            .page_id(Some("abc".to_string()))
            .quiet(true)
            .markdown_file_paths(vec!["a.md".to_string(), "-".to_string()])
            .build()
            .unwrap();
        assert_eq!(run_opts, expected);
    }

    #[test]
    fn unknown_output_format() {
        let result = CliOptions::try_parse_from(["md2notion", "--output", "yaml"]);
        check_err(&result, "invalid value 'yaml' for '--output <OUTPUT>'");
    }

    #[test]
    fn preserve_math_needs_a_value() {
        let result = CliOptions::try_parse_from(["md2notion", "--preserve-math", "maybe"]);
        check_err(&result, "invalid value 'maybe' for '--preserve-math <PRESERVE_MATH>'");
    }

    fn check_err(result: &Result<CliOptions, Error>, expect: &str) {
        unwrap!(result, Err(e));
        let e_str = e.to_string();
        let first_line = e_str.split('\n').next().expect("no error string found");
        let mut expect_full = "error: ".to_string();
        expect_full.push_str(expect);
        assert_eq!(first_line, &expect_full);
    }
}
