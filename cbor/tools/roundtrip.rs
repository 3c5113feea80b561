/*!
Roundtrip command - decode CBOR data and encode it again
*/

use anyhow::Context;
use clap::Parser;
use skein_cbor::{decode, encode};

use super::io::Stream;

/// Decode CBOR data and re-encode it
#[derive(Parser, Debug)]
#[command(about = "Decode CBOR data and encode it again", long_about = None)]
pub struct Command {
    /// Emit the canonical encoding (sorted keys, minimal floats)
    #[arg(long)]
    canonical: bool,

    /// Re-encode shared references (tags 28/29) instead of inlining
    #[arg(long)]
    share: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, default_value = "-")]
    output: Stream,

    /// Input CBOR file (use '-' for stdin)
    input: Stream,
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let data = self.input.read()?;
        let value = decode::from_slice(&data).context("cannot decode input")?;

        let options = encode::Options {
            style: if self.canonical {
                encode::EncodingStyle::Canonical
            } else {
                encode::EncodingStyle::Regular
            },
            value_sharing: self.share,
            ..Default::default()
        };
        let encoded = encode::to_vec_with(&value, options).context("cannot re-encode input")?;

        self.output.write(&encoded)
    }
}
