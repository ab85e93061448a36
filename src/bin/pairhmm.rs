use anyhow::{bail, Context};
use clap::{App, Arg, SubCommand};
use pairhmm::accelerator::SimulatedAccelerator;
use pairhmm::batch::{fill_batch, ProbabilityModel, SequenceSource, SynthConfig};
use pairhmm::forward::ForwardEngine;
use pairhmm::pipeline::RunConfig;
use pairhmm::workload::Geometry;
use pairhmm::{Decimal, Numeric, Posit32};
use std::io::Write;
use std::time::Duration;
#[macro_use]
extern crate log;

fn verbose() -> Arg<'static, 'static> {
    Arg::with_name("verbose")
        .short("v")
        .multiple(true)
        .help("Debug mode")
}

fn probs() -> Arg<'static, 'static> {
    Arg::with_name("probs")
        .long("probs")
        .takes_value(true)
        .possible_values(&["fixed", "random"])
        .default_value("fixed")
        .help("Per-position probabilities.")
}

fn seed() -> Arg<'static, 'static> {
    Arg::with_name("seed")
        .long("seed")
        .takes_value(true)
        .default_value("42")
        .help("Seed")
}

fn initial_power() -> Arg<'static, 'static> {
    Arg::with_name("initial_power")
        .long("initial-power")
        .takes_value(true)
        .allow_hyphen_values(true)
        .default_value("1")
        .help("The D-matrix seed is 2^[INITIAL_POWER] / padded haplotype length.")
}

fn subcommand_run() -> App<'static, 'static> {
    SubCommand::with_name("run")
        .version("0.1")
        .about("Runs a workload on the accelerator and validates its results.")
        .arg(verbose())
        .arg(
            Arg::with_name("pairs")
                .long("pairs")
                .short("p")
                .takes_value(true)
                .default_value("16")
                .help("Number of sequence pairs. A multiple of 16."),
        )
        .arg(
            Arg::with_name("read_len")
                .long("read-len")
                .short("x")
                .takes_value(true)
                .default_value("8")
                .help("Read length."),
        )
        .arg(
            Arg::with_name("hapl_len")
                .long("hapl-len")
                .short("y")
                .takes_value(true)
                .default_value("16")
                .help("Haplotype length."),
        )
        .arg(initial_power())
        .arg(
            Arg::with_name("cores")
                .long("cores")
                .short("c")
                .takes_value(true)
                .default_value("1")
                .help("Number of accelerator cores."),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .short("t")
                .takes_value(true)
                .default_value("1")
                .help("Number of threads"),
        )
        .arg(seed())
        .arg(probs())
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .takes_value(true)
                .default_value("600")
                .help("Seconds to wait for the accelerator."),
        )
        .arg(
            Arg::with_name("latency")
                .long("latency")
                .takes_value(true)
                .default_value("0")
                .help("Artificial latency of the simulated accelerator in milliseconds."),
        )
        .arg(
            Arg::with_name("report")
                .long("report")
                .short("r")
                .value_name("CSV")
                .takes_value(true)
                .help("Write the accuracy report here instead of stdout."),
        )
        .arg(
            Arg::with_name("show_table")
                .long("show-table")
                .help("Dump the M/I/D tables of the posit engine at trace level."),
        )
}

fn subcommand_pair() -> App<'static, 'static> {
    SubCommand::with_name("pair")
        .version("0.1")
        .about("Computes the forward probability of one pair in every number format.")
        .arg(verbose())
        .arg(
            Arg::with_name("read")
                .long("read")
                .takes_value(true)
                .required(true)
                .help("Read bases."),
        )
        .arg(
            Arg::with_name("hapl")
                .long("hapl")
                .takes_value(true)
                .required(true)
                .help("Haplotype bases."),
        )
        .arg(initial_power())
        .arg(seed())
        .arg(probs())
        .arg(
            Arg::with_name("show_table")
                .long("show-table")
                .help("Print the M/I/D tables."),
        )
}

fn parse<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = matches.value_of(name).with_context(|| format!("--{} is missing", name))?;
    value
        .parse()
        .with_context(|| format!("--{} got an invalid value {}", name, value))
}

fn probability_model(matches: &clap::ArgMatches) -> anyhow::Result<ProbabilityModel> {
    match matches.value_of("probs") {
        Some("random") => Ok(ProbabilityModel::Random {
            seed: parse(matches, "seed")?,
        }),
        Some("fixed") | None => Ok(ProbabilityModel::Fixed(Default::default())),
        Some(other) => bail!("unknown probability model {}", other),
    }
}

fn run(matches: &clap::ArgMatches) -> anyhow::Result<()> {
    let mut config = RunConfig::new(
        parse(matches, "pairs")?,
        parse(matches, "read_len")?,
        parse(matches, "hapl_len")?,
        parse(matches, "cores")?,
    );
    config.initial_power = parse(matches, "initial_power")?;
    config.sequences = SequenceSource::Random {
        seed: parse(matches, "seed")?,
    };
    config.probabilities = probability_model(matches)?;
    config.timeout = Duration::from_secs(parse(matches, "timeout")?);
    config.show_table = matches.is_present("show_table");
    let latency = Duration::from_millis(parse(matches, "latency")?);
    let mut accelerator = SimulatedAccelerator::new(latency);
    let summary =
        pairhmm::pipeline::run(&config, &mut accelerator).context("verification run failed")?;
    match matches.value_of("report") {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot create {}", path))?;
            let mut wtr = std::io::BufWriter::new(file);
            summary.validation.write_report(&mut wtr)?;
            wtr.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut wtr = std::io::BufWriter::new(stdout.lock());
            summary.validation.write_report(&mut wtr)?;
            wtr.flush()?;
        }
    }
    eprintln!(
        "{} errors in {} results. {:.3} GCUPS",
        summary.errors.violations,
        summary.errors.checked,
        summary.hardware_gcups()
    );
    if summary.errors.violations > 0 {
        bail!("{} results out of tolerance", summary.errors.violations);
    }
    Ok(())
}

fn pair(matches: &clap::ArgMatches) -> anyhow::Result<()> {
    let read = matches.value_of("read").context("--read is missing")?.as_bytes().to_vec();
    let hapl = matches.value_of("hapl").context("--hapl is missing")?.as_bytes().to_vec();
    let geometry = Geometry::new(read.len(), hapl.len());
    let initial_power: i32 = parse(matches, "initial_power")?;
    let config = SynthConfig::new(
        2f64.powi(initial_power),
        SequenceSource::Supplied { read, hapl },
        probability_model(matches)?,
    );
    let batch = fill_batch(0, geometry, &config);
    let show_table = matches.is_present("show_table");
    let stdout = std::io::stdout();
    let mut wtr = std::io::BufWriter::new(stdout.lock());
    fn report<T: Numeric, W: Write>(
        wtr: &mut W,
        batch: &pairhmm::batch::Batch,
        show_table: bool,
    ) -> std::io::Result<()> {
        let (x, y) = (batch.geometry.read_len, batch.geometry.hapl_len);
        let table = ForwardEngine::<T>::default().calculate_mids(batch, 0, x, y);
        if show_table {
            writeln!(wtr, "{}", table)?;
        }
        let result = table.result();
        writeln!(wtr, "{}\t{}\t{:?}", T::NAME, result, result.to_bits())
    }
    report::<f32, _>(&mut wtr, &batch, show_table)?;
    report::<Posit32, _>(&mut wtr, &batch, show_table)?;
    report::<Decimal, _>(&mut wtr, &batch, show_table)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let matches = App::new("pairhmm")
        .version("0.1")
        .about("Pair-HMM forward reference and accelerator verification.")
        .setting(clap::AppSettings::ArgRequiredElseHelp)
        .subcommand(subcommand_run())
        .subcommand(subcommand_pair())
        .get_matches();
    if let Some(sub_m) = matches.subcommand().1 {
        let level = match sub_m.occurrences_of("verbose") {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
        let threads: usize = match sub_m.value_of("threads") {
            Some(threads) => threads.parse().context("--threads got an invalid value")?,
            None => 1,
        };
        if let Err(why) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            debug!("{:?}", why);
        }
    }
    debug!("Start");
    match matches.subcommand() {
        ("run", Some(sub_m)) => run(sub_m),
        ("pair", Some(sub_m)) => pair(sub_m),
        _ => unreachable!(),
    }
}
