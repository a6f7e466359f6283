//! single-diffcoex command-line interface

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use single_diffcoex::cli::{
    AdjustArg, Cli, Commands, InputArgs, check_sample_selection, parse_sample_ranges,
};
use single_diffcoex::io::report::{adjust_p_values, write_labelled_matrix};
use single_diffcoex::io::{
    ExpressionTable, read_expression_table, read_module_assignment, write_dispersion_report,
    write_module_stats,
};
use single_diffcoex::{
    AnalysisConfig, CancelToken, ConditionData, DiffCoexAnalysis, ModuleAssignment, TieMethod,
};

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Dispersion {
            input,
            permutations,
            seed,
            ties,
            adjust,
            output,
        } => run_dispersion(&input, permutations, seed, ties, adjust, &output),
        Commands::ModuleStats {
            input,
            max_samples,
            output,
        } => run_module_stats(&input, max_samples, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

struct Inputs {
    condition_a: ConditionData,
    condition_b: ConditionData,
    assignment: ModuleAssignment,
    config: AnalysisConfig,
}

fn load_inputs(input: &InputArgs) -> Result<Inputs> {
    let mut config = match &input.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => AnalysisConfig::default(),
    };
    if input.threads.is_some() {
        config.threads = input.threads;
    }

    let mut table: ExpressionTable = read_expression_table(&input.expression)
        .with_context(|| format!("Failed to read expression table: {}", input.expression))?;
    if input.normalize {
        info!("Applying log2 and quantile normalization");
        table = table.normalized();
    }

    let assignment = read_module_assignment(&input.modules)
        .with_context(|| format!("Failed to read module table: {}", input.modules))?;

    let samples_a = parse_sample_ranges(&input.samples_a).context("Invalid --samples-a")?;
    let samples_b = parse_sample_ranges(&input.samples_b).context("Invalid --samples-b")?;
    check_sample_selection(&samples_a, &samples_b).context("Invalid sample selection")?;
    let condition_a = table.condition(&samples_a).context("Condition A")?;
    let condition_b = table.condition(&samples_b).context("Condition B")?;

    Ok(Inputs {
        condition_a,
        condition_b,
        assignment,
        config,
    })
}

fn run_dispersion(
    input: &InputArgs,
    permutations: Option<usize>,
    seed: Option<u64>,
    ties: Option<TieMethod>,
    adjust: Option<AdjustArg>,
    output: &str,
) -> Result<()> {
    let mut inputs = load_inputs(input)?;
    if let Some(p) = permutations {
        inputs.config.permutations = p;
    }
    if let Some(s) = seed {
        inputs.config.seed = s;
    }
    if let Some(t) = ties {
        inputs.config.ties = t;
    }

    let analysis = DiffCoexAnalysis::new(inputs.config);
    let report = analysis.run(
        &inputs.condition_a,
        &inputs.condition_b,
        &inputs.assignment,
        &CancelToken::new(),
    )?;

    write_dispersion_report(&report, output)
        .with_context(|| format!("Failed to write report to: {}", output))?;

    if let Some(AdjustArg::Bh) = adjust {
        let adjusted = adjust_p_values(&report)?;
        let path = std::path::Path::new(output).join("p_values_bh.csv");
        write_labelled_matrix(&path, &report.labels, &adjusted)?;
        info!("Adjusted p-values written to: {}", path.display());
    }

    let undefined = report.undefined_pairs();
    if !undefined.is_empty() {
        log::warn!(
            "{} module pairs have undefined dispersion (constant member columns)",
            undefined.len()
        );
    }

    let significant = report.significant_pairs(0.05);
    info!("Module pairs with p < 0.05: {}", significant.len());
    for (a, b, p) in significant.iter().take(10) {
        info!("  {} / {}: p = {}", a, b, p);
    }
    Ok(())
}

fn run_module_stats(input: &InputArgs, max_samples: Option<usize>, output: &str) -> Result<()> {
    let mut inputs = load_inputs(input)?;
    if max_samples.is_some() {
        inputs.config.max_samples = max_samples;
    }

    let analysis = DiffCoexAnalysis::new(inputs.config);
    let stats = analysis.module_stats(&inputs.condition_a, &inputs.condition_b, &inputs.assignment)?;
    write_module_stats(&stats, output)
        .with_context(|| format!("Failed to write module statistics: {}", output))?;
    Ok(())
}
