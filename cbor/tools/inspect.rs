/*!
Inspect command - display CBOR data as diagnostic notation or hex
*/

use anyhow::Context;
use clap::Parser;
use skein_cbor::decode::{self, Options, StrErrors};

use super::io::Stream;

/// Inspect and display CBOR data
#[derive(Parser, Debug)]
#[command(about = "Decode CBOR data and display it", long_about = None)]
pub struct Command {
    /// Output format
    #[arg(
        long,
        default_value = "diag",
        value_name = "FORMAT",
        help = "Output format: diag/diagnostic (human-readable), hex"
    )]
    format: OutputFormat,

    /// Substitute U+FFFD for invalid UTF-8 instead of failing
    #[arg(long)]
    lenient: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, default_value = "-")]
    output: Stream,

    /// Input CBOR file (use '-' for stdin)
    input: Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Diagnostic notation (RFC 8949 section 8)
    #[value(alias = "diagnostic")]
    Diag,
    /// Hexadecimal dump
    Hex,
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let data = self.input.read()?;

        let mut text = match self.format {
            OutputFormat::Diag => {
                let options = Options {
                    str_errors: if self.lenient {
                        StrErrors::Replace
                    } else {
                        StrErrors::Strict
                    },
                    ..Default::default()
                };
                let value =
                    decode::from_slice_with(&data, options).context("cannot decode input")?;
                value.to_string()
            }
            OutputFormat::Hex => hex::encode(&data),
        };
        if self.output.is_std() {
            text.push('\n');
        }

        self.output.write(text.as_bytes())
    }
}
