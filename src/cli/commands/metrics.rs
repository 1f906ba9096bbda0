//! `dmaic metrics` command - Derived quality and risk metrics

use console::style;
use miette::Result;

use crate::cli::helpers::{opt_num, print_rows, print_structured, render_table, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::metrics::MetricsReport;
use crate::entities::RiskLevel;

#[derive(clap::Args, Debug)]
pub struct MetricsArgs {
    /// Project ID, unique ID prefix, or name
    pub project: String,

    /// Store a freshly computed quality score and risk level on the project
    #[arg(long)]
    pub recompute: bool,
}

pub fn run(args: MetricsArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let project = session.project_id(&args.project)?;

    if args.recompute {
        let updated = session.engine.recompute_metrics(&project)?;
        if !global.quiet && session.format(global) == OutputFormat::Auto {
            println!(
                "{} Recomputed metrics for {}",
                style("✓").green(),
                style(&updated.id.to_string()).cyan()
            );
            println!();
        }
    }

    let report = session.engine.status(&project, false)?.metrics;

    match session.format(global) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&report, f),
        f @ (OutputFormat::Csv | OutputFormat::Tsv | OutputFormat::Id) => {
            let rows = vec![
                vec!["quality_score".to_string(), format!("{:.2}", report.quality_score)],
                vec!["risk_level".to_string(), report.risk_level.to_string()],
                vec!["criteria_met".to_string(), report.criteria_met.to_string()],
                vec!["criteria_total".to_string(), report.criteria_total.to_string()],
                vec!["risk_items".to_string(), report.risks.count.to_string()],
                vec!["average_rpn".to_string(), opt_num(report.risks.average_rpn, 1)],
                vec![
                    "sigma_level".to_string(),
                    report
                        .capability
                        .map_or_else(|| "-".to_string(), |c| c.sigma_level.to_string()),
                ],
                vec![
                    "cpk".to_string(),
                    opt_num(report.capability.map(|c| c.cpk), 3),
                ],
            ];
            print_rows(f, &["METRIC", "VALUE"], &rows)
        }
        OutputFormat::Auto => {
            print_metrics(&report);
            Ok(())
        }
    }
}

/// Human-readable metrics block, shared with `dmaic status`
pub fn print_metrics(report: &MetricsReport) {
    let risk = report.risk_level.to_string();
    let risk = match report.risk_level {
        RiskLevel::Low => style(risk).green(),
        RiskLevel::Medium => style(risk).yellow(),
        RiskLevel::High => style(risk).red().bold(),
    };
    println!("{}", style("METRICS").bold());
    println!("  Quality score:  {:.1} / 100", report.quality_score);
    println!("  Risk level:     {}", risk);
    println!(
        "  Gate criteria:  {} of {} met so far",
        report.criteria_met, report.criteria_total
    );

    if report.risks.count > 0 {
        let labels: Vec<String> = report
            .risks
            .by_label
            .iter()
            .map(|(label, n)| format!("{} {}", n, label))
            .collect();
        println!(
            "  FMEA:           {} item(s), average RPN {}, max {} ({})",
            report.risks.count,
            opt_num(report.risks.average_rpn, 1),
            report
                .risks
                .max_rpn
                .map_or_else(|| "-".to_string(), |m| m.to_string()),
            labels.join(", ")
        );
    }

    if let Some(cap) = &report.capability {
        println!(
            "  Capability:     sigma {}, DPMO {:.0}, Cp {:.3}, Cpk {:.3}",
            cap.sigma_level, cap.dpmo, cap.cp, cap.cpk
        );
    }

    if !report.kpis.is_empty() {
        let rows: Vec<Vec<String>> = report
            .kpis
            .iter()
            .map(|k| {
                vec![
                    k.name.clone(),
                    k.performance
                        .map_or_else(|| "-".to_string(), |p| format!("{:.1}%", p)),
                    if k.defect { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        println!("{}", render_table(&["KPI", "PERFORMANCE", "DEFECT"], &rows));
    }
}
