use std::path::Path;

use anyhow::{Context, Result};

use crate::milp::Dispatch;

/// Writes one row per period of `dispatch` to `file_path`.
///
/// # Arguments
/// * `file_path` - Destination CSV, created or truncated
/// * `dispatch` - Solved schedule
pub fn write_dispatch_csv(file_path: &Path, dispatch: &Dispatch) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("Failed to create file: {}", file_path.display()))?;

    for period in &dispatch.periods {
        writer
            .serialize(period)
            .with_context(|| format!("Failed to write period {}", period.period))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", file_path.display()))?;

    tracing::info!(
        rows = dispatch.periods.len(),
        file = %file_path.display(),
        "wrote dispatch"
    );
    Ok(())
}

pub fn print_dispatch_summary(dispatch: &Dispatch) {
    println!("=== BATTERY ARBITRAGE RESULTS ===");
    println!("Objective: {:.4}", dispatch.objective);
    println!("Solve time: {} ms", dispatch.optimization_duration_ms);
    println!("Energy charged: {:.4} MWh", dispatch.total_charged());
    println!("Energy discharged: {:.4} MWh", dispatch.total_discharged());
    if let Some(soc) = dispatch.final_soc() {
        println!("Final SOC: {:.4} MWh", soc);
    }
    println!();
    println!(
        "{:>4} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "t", "ch_price", "dis_price", "charge", "discharge", "soc"
    );
    for p in &dispatch.periods {
        println!(
            "{:>4} {:>10.2} {:>10.2} {:>10.4} {:>10.4} {:>10.4}",
            p.period,
            p.charge_price,
            p.discharge_price,
            if p.ch_state { p.charge_energy } else { 0.0 },
            if p.disch_state { p.discharge_energy } else { 0.0 },
            p.soc
        );
    }
}

#[cfg(test)]
mod tests {
    use battery_model::PeriodDispatch;

    use super::*;

    #[test]
    fn test_write_dispatch_csv() {
        let dispatch = Dispatch {
            periods: vec![
                PeriodDispatch {
                    period: 1,
                    charge_price: 1.0,
                    discharge_price: 1.0,
                    charge_energy: 5.0,
                    discharge_energy: 0.0,
                    ch_allowed: true,
                    ch_state: true,
                    disch_allowed: false,
                    disch_state: false,
                    soc: 5.0,
                },
                PeriodDispatch {
                    period: 2,
                    charge_price: 10.0,
                    discharge_price: 10.0,
                    charge_energy: 0.0,
                    discharge_energy: 5.0,
                    ch_allowed: false,
                    ch_state: false,
                    disch_allowed: true,
                    disch_state: true,
                    soc: 0.0,
                },
            ],
            objective: 45.0,
            optimization_duration_ms: 3,
        };

        let file = tempfile::NamedTempFile::new().unwrap();
        write_dispatch_csv(file.path(), &dispatch).unwrap();

        let written = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next().unwrap(),
            "period,charge_price,discharge_price,charge_energy,discharge_energy,\
             ch_allowed,ch_state,disch_allowed,disch_state,soc"
        );
        assert_eq!(lines.next().unwrap(), "1,1.0,1.0,5.0,0.0,true,true,false,false,5.0");
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("dispatch.csv");
        assert!(write_dispatch_csv(&path, &Dispatch::default()).is_err());
    }
}
