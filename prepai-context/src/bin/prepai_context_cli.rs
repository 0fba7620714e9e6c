use clap::Parser;
use prepai_context::text::{DEFAULT_CHUNK_SIZE, TextSplitter};
use std::fs;
use std::io::{self, Read};

/// A CLI tool to chunk text files into JSON output using prepai-context.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input text file. If not provided, reads from stdin.
    #[arg(short, long)]
    input: Option<String>,

    /// Maximum length for each text chunk, in characters.
    #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let file_content = if let Some(input_path) = args.input {
        fs::read_to_string(input_path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let splitter = TextSplitter::new(args.chunk_size);
    let chunks = splitter.split(&file_content);

    let json_output = serde_json::to_string_pretty(&chunks)?;
    println!("{}", json_output);

    Ok(())
}
