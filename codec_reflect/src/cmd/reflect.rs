/* Binary for decoding JSON documents with codec IR bundles and printing the result */

use anyhow::Context;
use clap::Parser as ClapParser;
use codec_gen::codegen::ir::CodecBundle;
use codec_reflect::{CodecInterpreter, PassthroughCodec};
use codec_types::TypeRef;
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "codec-reflect")]
#[command(about = "Decode JSON with generated codec IR and print the result")]
struct Args {
  /* Codec IR bundle(s) to load */
  #[arg(short, long, required = true)]
  ir_file: Vec<PathBuf>,

  /* Canonical type name to decode, e.g. "app.Pair<int, string>" */
  #[arg(short, long, required = true)]
  type_name: String,

  /* JSON document to decode */
  #[arg(short, long, required = true)]
  data_file: PathBuf,

  /* Pretty print JSON output */
  #[arg(short, long)]
  pretty: bool,

  /* Print the document as re-encoded by the codec instead of the decoded fields */
  #[arg(short = 'r', long)]
  reencode: bool,
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();

  /* Load all bundles */
  let mut bundles = Vec::with_capacity(args.ir_file.len());
  for path in &args.ir_file {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let bundle = CodecBundle::from_json(&text).with_context(|| format!("invalid codec IR in {}", path.display()))?;
    bundles.push(bundle);
  }
  let bundle_refs: Vec<&CodecBundle> = bundles.iter().collect();

  let type_ref: TypeRef = args.type_name.parse()?;
  let interpreter = CodecInterpreter::new(&bundle_refs, &PassthroughCodec);
  if !interpreter.supports(&type_ref) {
    eprintln!("Warning: no generated codec for {}; using the passthrough codec", type_ref);
  }

  let document = std::fs::read_to_string(&args.data_file)
    .with_context(|| format!("failed to read {}", args.data_file.display()))?;
  let value = interpreter
    .decode_str(&type_ref, &document)
    .map_err(|e| anyhow::anyhow!("Failed to decode document: {}", e))?;

  let output = if args.reencode { interpreter.encode_to_json(&type_ref, &value)? } else { value.to_json() };

  if args.pretty {
    println!("{}", serde_json::to_string_pretty(&output)?);
  } else {
    println!("{}", serde_json::to_string(&output)?);
  }

  Ok(())
}
