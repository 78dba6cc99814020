//! Field tree dump
//!
//! Decodes a hex-encoded buffer and prints every field with its extent and,
//! where the payload is a scalar or array, its value.
//!
//! Run with: cargo run --bin fieldwire-dump -- --compact 0700000002000000...

use std::io::Read;

use clap::Parser;
use fieldwire::{
    BinarySerialiser, CompactSerialiser, DataType, FastByteBuffer, FieldHeader, FieldTree, IoSerialiser,
    SerialiserConfig,
};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "fieldwire-dump")]
#[command(about = "Print the field tree of a fieldwire buffer")]
struct Args {
    /// Hex-encoded buffer; read from stdin when omitted
    hex: Option<String>,

    /// Decode with the compact format instead of the primary one
    #[arg(short, long)]
    compact: bool,

    /// Print field extents only, without decoding values
    #[arg(long)]
    no_values: bool,

    /// Maximum nesting depth accepted
    #[arg(long, default_value_t = fieldwire::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// One line of output for `header`
fn describe<S: IoSerialiser>(ser: &mut S, header: &FieldHeader, values: bool) -> String {
    let mut line = format!(
        "{} [{}] start={} size={}",
        header.name, header.data_type, header.data_start, header.data_size
    );
    if let Some(unit) = &header.meta.unit {
        line.push_str(&format!(" unit={}", unit));
    }
    if !values {
        return line;
    }
    let value = match header.data_type {
        t if t.is_scalar() => ser.get_boxed(header).map(|v| v.to_string()),
        t if t.is_array() => ser.get_boxed_array(header).map(|a| format!("{:?}", a.to_values())),
        t if t.is_collection() => ser.get_boxed_collection(header).map(|a| format!("{:?}", a.to_values())),
        DataType::Enum => ser.get_enum_value(header).map(|e| format!("{}::{}", e.family.name, e.member)),
        _ => return line,
    };
    match value {
        Ok(value) => line.push_str(&format!(" = {}", value)),
        Err(e) => line.push_str(&format!(" <{}>", e)),
    }
    line
}

fn render<S: IoSerialiser>(ser: &mut S, tree: &FieldTree, values: bool) -> String {
    let mut out = String::new();
    for (depth, id) in tree.walk() {
        let line = describe(ser, tree.header(id), values);
        out.push_str(&format!("{:indent$}{}\n", "", line, indent = depth * 2));
    }
    out
}

fn dump<S: IoSerialiser>(mut ser: S, values: bool) -> fieldwire::Result<String> {
    let tree = ser.parse_stream()?;
    debug!(fields = tree.len(), "decoded field tree");
    Ok(render(&mut ser, &tree, values))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let text = match args.hex {
        Some(text) => text,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    let digits: String = text.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    let bytes = hex::decode(digits)?;
    debug!(len = bytes.len(), "decoded input");

    let buffer = FastByteBuffer::from_slice(&bytes);
    let config = SerialiserConfig::default().with_max_depth(args.max_depth);
    let values = !args.no_values;
    let output = if args.compact {
        dump(CompactSerialiser::with_config(buffer, config), values)?
    } else {
        dump(BinarySerialiser::with_config(buffer, config), values)?
    };
    print!("{}", output);

    Ok(())
}
