/*!
skein - a CLI for working with CBOR data

# Commands

- `inspect`: decode CBOR data and display it as diagnostic notation or hex
- `roundtrip`: decode CBOR data and re-encode it, optionally canonically

# Examples

```bash
# Show a CBOR file as diagnostic notation
skein inspect data.cbor

# Hex dump
skein inspect --format hex data.cbor

# Normalize a document to its canonical encoding
skein roundtrip --canonical data.cbor -o canonical.cbor

# Pipe through stdin/stdout
cat data.cbor | skein roundtrip --canonical | skein inspect
```
*/

use clap::{Parser, Subcommand};

mod inspect;
mod io;
mod roundtrip;

/// A CLI tool for working with CBOR data
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Inspect and re-encode CBOR data",
    long_about = "skein decodes CBOR (Concise Binary Object Representation) documents \
                  into a value graph and renders or re-encodes them.\n\n\
                  Semantic tags (datetimes, bignums, sets, shared references, ...) are \
                  decoded to their typed values, and shared or cyclic structure is \
                  preserved across a roundtrip."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode CBOR data and display it
    Inspect(inspect::Command),

    /// Decode CBOR data and encode it again
    Roundtrip(roundtrip::Command),
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Commands::Inspect(args) => args.exec(),
        Commands::Roundtrip(args) => args.exec(),
    }
}
