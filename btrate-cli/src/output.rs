/// Output formatting: terminal tables and JSON.
use anyhow::Result;
use btrate_core::constants::{DEFAULT_ELO_BASE, DEFAULT_ELO_SCALE};
use btrate_core::{to_elo, EvolutionPoint, PosteriorSummary, RatingReport, TraceEntry, WinProbabilityMatrix};
use serde::Serialize;
use std::io::{self, Write};

/// Thresholds reported by `btrate evolution`.
pub const EVOLUTION_THRESHOLDS: [f64; 4] = [0.5, 0.1, 0.05, 0.01];

#[derive(Serialize)]
struct JsonRatedPlayer<'a> {
    rank: usize,
    name: &'a str,
    rating: f64,
    /// `None` when the interval is unbounded.
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
    std_error: Option<f64>,
    under_determined: bool,
    wins: usize,
    losses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    elo: Option<f64>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    players: Vec<JsonRatedPlayer<'a>>,
    win_probabilities: &'a WinProbabilityMatrix,
    converged: bool,
    iterations: usize,
    log_posterior: f64,
    confidence_level: f64,
    num_matches: usize,
    disconnected_components: Vec<&'a [String]>,
    trace: &'a [TraceEntry],
}

fn finite(x: f64) -> Option<f64> {
    x.is_finite().then_some(x)
}

fn elo(rating: f64) -> f64 {
    to_elo(rating, DEFAULT_ELO_SCALE, DEFAULT_ELO_BASE)
}

fn format_bound(x: f64) -> String {
    if x.is_finite() {
        format!("{x:.3}")
    } else if x > 0.0 {
        "+inf".to_string()
    } else {
        "-inf".to_string()
    }
}

/// Ranked table plus convergence summary and component warnings.
pub fn write_table<W: Write>(out: &mut W, report: &RatingReport, show_elo: bool) -> io::Result<()> {
    let name_width = report
        .players
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(6)
        .max(6); // at least "Player"

    let ci_label = format!("{:.0}% CI", report.confidence_level * 100.0);
    let elo_header = if show_elo { " |     Elo" } else { "" };

    writeln!(
        out,
        "  # | {:<name_width$} |  Rating | {:>19} | Std err |     W-L{elo_header}",
        "Player", ci_label
    )?;
    writeln!(
        out,
        "----|-{}-|---------|---------------------|---------|--------{}",
        "-".repeat(name_width),
        if show_elo { "|---------" } else { "" }
    )?;

    for (i, p) in report.players.iter().enumerate() {
        let ci = format!("[{}, {}]", format_bound(p.lower), format_bound(p.upper));
        let se = if p.std_error.is_finite() { format!("{:.3}", p.std_error) } else { "inf".to_string() };
        let wl = format!("{}-{}", p.wins, p.losses);
        write!(
            out,
            "{:>3} | {:<name_width$} | {:>7.3} | {:>19} | {:>7} | {:>7}",
            i + 1,
            p.name,
            p.rating,
            ci,
            se,
            wl
        )?;
        if show_elo {
            write!(out, " | {:>7.1}", elo(p.rating))?;
        }
        writeln!(out)?;
    }

    writeln!(
        out,
        "\n{} players rated from {} matches",
        report.num_players(),
        report.num_matches
    )?;
    if report.converged {
        writeln!(
            out,
            "Converged after {} iterations (log-posterior {:.4})",
            report.iterations, report.log_posterior
        )?;
    } else {
        writeln!(
            out,
            "Warning: did not converge within {} iterations (log-posterior {:.4}); ratings are the best estimate so far",
            report.iterations, report.log_posterior
        )?;
    }

    let under_determined: Vec<&str> = report
        .players
        .iter()
        .filter(|p| p.under_determined)
        .map(|p| p.name.as_str())
        .collect();
    if !under_determined.is_empty() {
        writeln!(out, "Warning: no usable interval for {}", under_determined.join(", "))?;
    }

    if !report.is_connected() {
        writeln!(
            out,
            "Warning: players form {} groups that never met; ratings are only comparable within a group:",
            report.disconnected_components.len()
        )?;
        for (i, component) in report.disconnected_components.iter().enumerate() {
            writeln!(out, "  group {}: {}", i + 1, component.players.join(", "))?;
        }
    }

    Ok(())
}

/// Print results as a formatted terminal table.
pub fn print_table(report: &RatingReport, show_elo: bool) -> Result<()> {
    write_table(&mut io::stdout().lock(), report, show_elo)?;
    Ok(())
}

/// Posterior sampler results: mean, median, sd and percentile interval per player.
pub fn write_posterior<W: Write>(out: &mut W, summary: &PosteriorSummary) -> io::Result<()> {
    let name_width = summary
        .players
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(6)
        .max(6);
    let ci_label = format!("{:.0}% CI", summary.confidence_level * 100.0);

    writeln!(
        out,
        "  # | {:<name_width$} |    Mean |  Median |  Std dev | {:>19}",
        "Player", ci_label
    )?;
    writeln!(
        out,
        "----|-{}-|---------|---------|----------|--------------------",
        "-".repeat(name_width)
    )?;
    for (i, p) in summary.players.iter().enumerate() {
        let ci = format!("[{:.3}, {:.3}]", p.lower, p.upper);
        writeln!(
            out,
            "{:>3} | {:<name_width$} | {:>7.3} | {:>7.3} | {:>8.3} | {:>19}",
            i + 1,
            p.name,
            p.mean,
            p.median,
            p.std_dev,
            ci
        )?;
    }

    writeln!(
        out,
        "\n{} posterior samples, acceptance rate {:.1}%",
        summary.num_samples,
        summary.acceptance_rate * 100.0
    )
}

pub fn print_posterior(summary: &PosteriorSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        write_posterior(&mut io::stdout().lock(), summary)?;
    }
    Ok(())
}

fn json_output(report: &RatingReport, show_elo: bool) -> JsonOutput<'_> {
    let players = report
        .players
        .iter()
        .enumerate()
        .map(|(i, p)| JsonRatedPlayer {
            rank: i + 1,
            name: &p.name,
            rating: p.rating,
            lower_bound: finite(p.lower),
            upper_bound: finite(p.upper),
            std_error: finite(p.std_error),
            under_determined: p.under_determined,
            wins: p.wins,
            losses: p.losses,
            elo: show_elo.then(|| elo(p.rating)),
        })
        .collect();

    JsonOutput {
        players,
        win_probabilities: &report.win_probabilities,
        converged: report.converged,
        iterations: report.iterations,
        log_posterior: report.log_posterior,
        confidence_level: report.confidence_level,
        num_matches: report.num_matches,
        disconnected_components: report
            .disconnected_components
            .iter()
            .map(|c| c.players.as_slice())
            .collect(),
        trace: &report.trace,
    }
}

/// Print results as JSON.
pub fn print_json(report: &RatingReport, show_elo: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&json_output(report, show_elo))?);
    Ok(())
}

/// Evolution table plus the first match count at which each threshold was reached.
pub fn write_evolution<W: Write>(
    out: &mut W,
    points: &[EvolutionPoint],
    crossings: &[(f64, Option<usize>)],
) -> io::Result<()> {
    writeln!(out, " Matches | Players | Max change | Converged")?;
    writeln!(out, "---------|---------|------------|----------")?;
    for p in points {
        let change = p.max_rating_change.map_or_else(|| "-".to_string(), |c| format!("{c:.4}"));
        writeln!(
            out,
            "{:>8} | {:>7} | {:>10} | {}",
            p.num_matches,
            p.ratings.len(),
            change,
            if p.converged { "yes" } else { "no" }
        )?;
    }

    writeln!(out)?;
    for (threshold, reached) in crossings {
        match reached {
            Some(n) => writeln!(out, "Max change below {threshold} first at {n} matches")?,
            None => writeln!(out, "Max change never fell below {threshold}")?,
        }
    }

    Ok(())
}

pub fn print_evolution(points: &[EvolutionPoint], crossings: &[(f64, Option<usize>)]) -> Result<()> {
    write_evolution(&mut io::stdout().lock(), points, crossings)?;
    Ok(())
}
