use clap::Parser as ClapParser;
use std::{
    io::{self, Write},
    process,
};

use qn::{
    CELL_SIZE, Context, ContextCreateInfo, DEFAULT_ARENA_SIZE, DEFAULT_ROOT_STACK_SIZE,
    ErrorPolicy, Host, Obj, Result,
};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Arena size in bytes
    #[arg(long, default_value_t = DEFAULT_ARENA_SIZE)]
    size: usize,

    /// Root stack capacity
    #[arg(long, default_value_t = DEFAULT_ROOT_STACK_SIZE)]
    root_stack: usize,

    /// Stress rounds to run
    #[arg(long, default_value_t = 1000)]
    rounds: usize,

    /// Length of the list built every round
    #[arg(long, default_value_t = 32)]
    list_length: usize,

    /// Exit the process on the first error instead of reporting it
    #[arg(long, help = "Terminate on the first runtime error")]
    exit_on_error: bool,
}

struct OutputHost<W>(W);

impl<W: Write> Host for OutputHost<W> {
    fn write(&mut self, byte: u8) {
        if let Err(err) = self.0.write_all(&[byte]) {
            log::warn!("could not write output: {}", err);
        }
    }
}

fn round(ctx: &mut Context, index: usize, length: usize) -> Result<Obj> {
    let mark = ctx.save();

    let mut items = Vec::with_capacity(length);
    for i in 0..length {
        items.push(ctx.number((index * length + i) as f32)?);
    }
    let list = ctx.list(&items)?;
    let text = ctx.string(&format!("round {}", index))?;
    let symbol = ctx.symbol(&format!("round-{}", index % 16))?;
    let entry = ctx.cons(text, list)?;
    ctx.set(symbol, entry)?;

    // symbols stay reachable through the symbol table
    ctx.restore(mark);
    Ok(symbol)
}

fn run(cli: &Cli) -> Result<()> {
    let mut ctx = Context::with_host(
        ContextCreateInfo {
            size: cli.size,
            root_stack_size: Some(cli.root_stack),
            error_policy: cli.exit_on_error.then_some(ErrorPolicy::Exit),
            ..Default::default()
        },
        OutputHost(io::stdout()),
    )?;

    let mut last = Obj::NIL;
    for index in 0..cli.rounds {
        last = round(&mut ctx, index, cli.list_length)?;
    }

    if !last.is_nil() {
        let entry = ctx.global(last)?;
        ctx.write(entry);
        ctx.write_byte(b'\n');
    }
    ctx.collect();

    let stats = ctx.stats();
    println!(
        "{} cells of {} bytes, {} symbols",
        ctx.heap().capacity(),
        CELL_SIZE,
        ctx.symbol_count()
    );
    println!(
        "{} collections, {} reclaimed in total, {} live, {} free",
        stats.collections, stats.total_reclaimed, stats.live, stats.free
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        eprintln!("qn: {}", err);
        process::exit(1);
    }
}
