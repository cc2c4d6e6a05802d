use std::fs::File;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use crossterm::style::{Attribute, Color as TermColor, Stylize};
use spinners::{Spinner, Spinners};

use janus::scramble::scramble_from_str;
use janus::{Config, Cube, Error, Metric, Naso, Twist};

#[derive(Parser)]
#[command(author, version, about = "Optimal Rubik's cube solver", long_about = None)]
#[command(arg_required_else_help(true))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "finds every minimal solution for a scramble")]
    Solve {
        #[arg(help = "scramble in Singmaster notation, e.g. \"R U R' U R U2 R'\"")]
        scramble: String,

        #[arg(long, help = "count in the quarter-turn metric (half turns cost two)")]
        qtm: bool,

        #[arg(
            long,
            help = "use the reduced noseless depth table (~22 GB instead of ~44 GB)"
        )]
        enares: bool,

        #[arg(short, long, help = "print search progress instead of a spinner")]
        verbose: bool,
    },
}

fn depth_table_filename(config: &Config) -> String {
    let mut filename = String::from("depthTable-");
    filename += match config.metric {
        Metric::QuarterTurn => "QTM",
        Metric::FaceTurn => "FTM",
    };
    if config.naso == Naso::Aequivalens {
        filename += "-enares";
    }
    filename += ".janus";
    filename
}

fn load_table(filename: &str, buffer: &mut [u8]) -> bool {
    let mut file = match File::open(filename) {
        Ok(file) => file,
        Err(error) => {
            eprintln!("{}: {}", filename, error);
            return false;
        }
    };

    eprintln!("reading {}...", filename);
    match file.read_exact(buffer) {
        Ok(()) => {
            eprintln!("{} bytes read", buffer.len());
            true
        }
        Err(error) => {
            eprintln!("couldn't read {}: {}", filename, error);
            false
        }
    }
}

fn save_table(filename: &str, bytes: &[u8]) -> bool {
    let mut file = match File::create(filename) {
        Ok(file) => file,
        Err(error) => {
            eprintln!("{}: {}", filename, error);
            return false;
        }
    };

    eprintln!("writing {}...", filename);
    match file.write_all(bytes) {
        Ok(()) => {
            eprintln!("{} bytes written", bytes.len());
            true
        }
        Err(error) => {
            eprintln!("couldn't write {}: {}", filename, error);
            if std::fs::remove_file(filename).is_err() {
                eprintln!("couldn't remove incomplete {}", filename);
            }
            false
        }
    }
}

/// Number of moves a solution costs under the metric.
fn move_count(metric: Metric, solution: &[u8]) -> usize {
    match metric {
        Metric::FaceTurn => solution.len(),
        Metric::QuarterTurn => solution.iter().map(|&m| if m >= 12 { 2 } else { 1 }).sum(),
    }
}

/// Print one solution, parenthesizing consecutive twists of the same
/// axis: those commute, so both orders stand for the same maneuver.
fn print_solution(n: usize, solution: &[u8]) {
    print!("{:3}. ", n);
    for (i, &m) in solution.iter().enumerate() {
        let twist = Twist::try_from(m).expect("solver emitted a valid twist");
        if i + 1 < solution.len() && m % 3 == solution[i + 1] % 3 {
            print!("({twist} ");
        } else if i > 0 && solution[i - 1] % 3 == m % 3 {
            print!("{twist}) ");
        } else {
            print!("{twist} ");
        }
    }
    println!();
}

fn solve(scramble: &str, qtm: bool, enares: bool, verbose: bool) -> Result<(), Error> {
    let config = Config {
        metric: if qtm {
            Metric::QuarterTurn
        } else {
            Metric::FaceTurn
        },
        naso: if enares {
            Naso::Aequivalens
        } else {
            Naso::Disparilis
        },
    };

    // validate before spending hours on the table
    scramble_from_str(scramble)?;

    let filename = depth_table_filename(&config);
    let mut cube = Cube::new(
        config,
        |line| eprintln!("{}", line),
        {
            let filename = filename.clone();
            move |buffer: &mut [u8]| load_table(&filename, buffer)
        },
        move |bytes: &[u8]| save_table(&filename, bytes),
    )?;

    cube.apply_scramble(scramble)?;
    println!("solving scramble \"{}\"", scramble);

    let metric = config.metric;
    let adjective = match metric {
        Metric::QuarterTurn => "quarter",
        Metric::FaceTurn => "face",
    };

    let started = Instant::now();
    let mut spinner = (!verbose).then(|| Spinner::new(Spinners::Dots, "Solving".to_owned()));

    let announced = Arc::new(AtomicBool::new(false));
    let on_solution = {
        let announced = Arc::clone(&announced);
        move |n: usize, solution: &[u8]| {
            if verbose {
                if !announced.swap(true, Ordering::SeqCst) {
                    println!(
                        "minimal {}-move ({} turn) solution(s) found:",
                        move_count(metric, solution),
                        adjective
                    );
                }
                print_solution(n, solution);
            }
        }
    };

    cube.solve(
        move |depth| {
            if verbose {
                eprintln!("searching depth {}...", depth);
            }
        },
        on_solution,
        move |success| {
            if verbose {
                eprintln!("search {}", if success { "complete" } else { "aborted" });
            }
        },
        false,
    );

    if let Some(spinner) = spinner.as_mut() {
        spinner.stop_with_newline();
    }

    let solutions = cube.solutions();
    if solutions.is_empty() {
        println!("no solution found");
        return Ok(());
    }

    if !verbose {
        println!(
            "minimal {}-move ({} turn) solution(s) found:",
            move_count(metric, &solutions[0]),
            adjective
        );
        for (i, solution) in solutions.iter().enumerate() {
            print_solution(i + 1, solution);
        }
    }
    println!("solve time: {:?}", started.elapsed());

    Ok(())
}

fn main() {
    let program = Cli::parse();

    let result = match &program.command {
        Some(Commands::Solve {
            scramble,
            qtm,
            enares,
            verbose,
        }) => solve(scramble, *qtm, *enares, *verbose),
        None => Ok(()),
    };

    if let Err(error) = result {
        let styled = "Error:".with(TermColor::Red).attribute(Attribute::Bold);
        eprintln!("{styled} {error}");
        std::process::exit(1);
    }
}
