use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use sable::reader::SmaliReader;
use sable::writer::SmaliWriter;
use sablevm::executor::OpcodeTable;
use sablevm::value::Value;
use sablevm::vm::SmaliVm;

#[derive(Debug, Parser)]
#[command(name = "sablerun", about = "Run and rewrite Smali sources on an in-process register machine")]
struct Cli {
	/// Be verbose.
	#[arg(short = 'v', long = "verbose")]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Loads a class and invokes one of its static methods
	Run {
		file: PathBuf,
		/// Method name, or a full signature such as `add(II)I`
		method: String,
		/// Arguments; integers, floats, booleans and `null` are
		/// recognized, everything else is passed as a string
		args: Vec<String>,
		/// Skip the class initializer
		#[arg(long = "no-init")]
		no_init: bool,
		/// Fail on unknown opcodes instead of treating them as no-ops
		#[arg(long = "strict")]
		strict: bool,
	},
	/// Parses a source and prints it back in canonical form
	Rewrite {
		file: PathBuf,
	},
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	setup_logger(cli.verbose)?;

	match cli.command {
		Command::Run { file, method, args, no_init, strict } => run(&file, &method, &args, !no_init, strict),
		Command::Rewrite { file } => rewrite(&file),
	}
}

fn setup_logger(verbose: bool) -> Result<()> {
	let level = if verbose {
		log::LevelFilter::Debug
	} else {
		log::LevelFilter::Warn
	};
	fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!("[{}] {}", record.level(), message));
		})
		.level(level)
		.chain(std::io::stderr())
		.apply()
		.context("failed to set up logging")
}

fn run(file: &Path, method: &str, args: &[String], init: bool, strict: bool) -> Result<()> {
	let source = fs::read_to_string(file)
		.with_context(|| anyhow!("failed to read {file:?}"))?;

	let vm = SmaliVm::with_options(OpcodeTable::standard(), strict);
	let class = vm.load_class(&source, init, false)?;

	let method = if method.contains('(') {
		class.method(method)?
	} else {
		class.broker(method)?.resolve(args.len(), None)?
	};
	if !method.is_static() {
		bail!("only static methods can be invoked from the command line");
	}

	let values: Vec<Value> = args.iter().map(|raw| parse_argument(raw)).collect();
	let result = vm.call(&method, None, &values)?;
	println!("{result}");
	Ok(())
}

fn parse_argument(raw: &str) -> Value {
	if let Ok(int) = raw.parse::<i64>() {
		return Value::Int(int);
	}
	if let Ok(float) = raw.parse::<f64>() {
		return Value::Float(float);
	}
	match raw {
		"true" => Value::Bool(true),
		"false" => Value::Bool(false),
		"null" => Value::Null,
		_ => Value::String(raw.to_owned()),
	}
}

fn rewrite(file: &Path) -> Result<()> {
	let source = fs::read_to_string(file)
		.with_context(|| anyhow!("failed to read {file:?}"))?;

	let mut writer = SmaliWriter::new();
	SmaliReader::new().comments(true).visit(&source, &mut writer)?;
	print!("{}", writer.code());
	Ok(())
}
