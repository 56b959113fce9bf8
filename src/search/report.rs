//! Search results and their text and JSON output.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::games::dice::DiceConfig;
use crate::search::mean;

/// Outcome of one (θ, γ) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Convergence threshold used.
    pub theta: f64,
    /// Discount factor used.
    pub gamma: f64,
    /// Mean score over the games played; `None` if the solver gave up.
    pub mean_score: Option<f64>,
    /// Games played.
    pub games: usize,
    /// Seconds spent building the solver.
    pub solve_seconds: f64,
    /// Seconds spent playing games.
    pub play_seconds: f64,
    /// Sweeps the solver ran.
    pub sweeps: u64,
    /// Whether the solver reached its threshold.
    pub converged: bool,
}

impl RunRecord {
    /// Solve plus play time.
    pub fn total_seconds(&self) -> f64 {
        self.solve_seconds + self.play_seconds
    }
}

/// Means over the converged runs of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    /// Mean convergence threshold.
    pub theta: f64,
    /// Mean discount factor.
    pub gamma: f64,
    /// Mean of the per-run mean scores.
    pub mean_score: f64,
    /// Mean solve time.
    pub solve_seconds: f64,
    /// Mean play time.
    pub play_seconds: f64,
    /// Mean sweep count.
    pub sweeps: f64,
    /// Number of runs averaged.
    pub runs: usize,
}

/// All runs of one search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    /// Kind of search that produced the runs.
    pub name: String,
    /// Game the runs were solved on.
    pub game: DiceConfig,
    /// Runs in the order they were requested.
    pub records: Vec<RunRecord>,
}

impl SearchReport {
    /// Create a report.
    pub fn new(name: impl Into<String>, game: DiceConfig, records: Vec<RunRecord>) -> Self {
        Self {
            name: name.into(),
            game,
            records,
        }
    }

    /// Highest scoring converged run. Ties go to the faster run, then the earlier one.
    pub fn best(&self) -> Option<&RunRecord> {
        let mut best: Option<(&RunRecord, f64)> = None;
        for record in &self.records {
            let Some(score) = record.mean_score else {
                continue;
            };
            let better = match best {
                None => true,
                Some((current, current_score)) => {
                    score > current_score
                        || (score == current_score && record.total_seconds() < current.total_seconds())
                }
            };
            if better {
                best = Some((record, score));
            }
        }
        best.map(|(record, _)| record)
    }

    /// Number of runs that hit the sweep ceiling.
    pub fn unconverged(&self) -> usize {
        self.records.iter().filter(|r| !r.converged).count()
    }

    /// Averages over converged runs, or `None` if there are none.
    pub fn averages(&self) -> Option<Averages> {
        let converged: Vec<&RunRecord> = self.records.iter().filter(|r| r.converged).collect();
        let thetas: Vec<f64> = converged.iter().map(|r| r.theta).collect();
        let gammas: Vec<f64> = converged.iter().map(|r| r.gamma).collect();
        let scores: Vec<f64> = converged.iter().filter_map(|r| r.mean_score).collect();
        let solve: Vec<f64> = converged.iter().map(|r| r.solve_seconds).collect();
        let play: Vec<f64> = converged.iter().map(|r| r.play_seconds).collect();
        let sweeps: Vec<f64> = converged.iter().map(|r| r.sweeps as f64).collect();

        Some(Averages {
            theta: mean(&thetas)?,
            gamma: mean(&gammas)?,
            mean_score: mean(&scores)?,
            solve_seconds: mean(&solve)?,
            play_seconds: mean(&play)?,
            sweeps: mean(&sweeps)?,
            runs: converged.len(),
        })
    }

    /// Print every run followed by the averages and the best run.
    pub fn print_summary(&self) {
        println!("\n=== {} search ({} runs) ===", self.name, self.records.len());
        println!(
            "{:>12} {:>8} {:>10} {:>8} {:>10} {:>10}",
            "theta", "gamma", "score", "sweeps", "solve (s)", "play (s)"
        );

        for r in &self.records {
            let score = match r.mean_score {
                Some(s) => format!("{:.3}", s),
                None => "-".to_string(),
            };
            println!(
                "{:>12.6} {:>8.4} {:>10} {:>8} {:>10.4} {:>10.4}",
                r.theta, r.gamma, score, r.sweeps, r.solve_seconds, r.play_seconds
            );
        }

        if let Some(avg) = self.averages() {
            println!("\nAverages over {} converged runs:", avg.runs);
            println!("  Theta:      {:.6}", avg.theta);
            println!("  Gamma:      {:.4}", avg.gamma);
            println!("  Score:      {:.3}", avg.mean_score);
            println!("  Sweeps:     {:.1}", avg.sweeps);
            println!("  Solve time: {:.4}s", avg.solve_seconds);
            println!("  Play time:  {:.4}s", avg.play_seconds);
        }

        let unconverged = self.unconverged();
        if unconverged > 0 {
            println!("\n{} runs hit the sweep ceiling", unconverged);
        }

        match self.best() {
            Some(best) => println!(
                "\nBest: theta={:.6}, gamma={:.4}, score={:.3} ({:.4}s)",
                best.theta,
                best.gamma,
                best.mean_score.unwrap_or_default(),
                best.total_seconds()
            ),
            None => println!("\nNo run converged"),
        }
    }

    /// Save the report as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(theta: f64, score: Option<f64>, solve: f64) -> RunRecord {
        RunRecord {
            theta,
            gamma: 0.9,
            mean_score: score,
            games: if score.is_some() { 10 } else { 0 },
            solve_seconds: solve,
            play_seconds: 0.5,
            sweeps: 4,
            converged: score.is_some(),
        }
    }

    #[test]
    fn test_best_prefers_score_then_time() {
        let report = SearchReport::new(
            "grid",
            DiceConfig::default(),
            vec![
                record(0.1, Some(12.0), 2.0),
                record(0.2, Some(14.0), 3.0),
                record(0.3, Some(14.0), 1.0),
                record(0.4, None, 0.1),
            ],
        );

        let best = report.best().unwrap();
        assert_eq!(best.theta, 0.3);
    }

    #[test]
    fn test_best_ignores_unconverged() {
        let report = SearchReport::new("grid", DiceConfig::default(), vec![record(0.1, None, 1.0)]);
        assert!(report.best().is_none());
        assert!(report.averages().is_none());
        assert_eq!(report.unconverged(), 1);
    }

    #[test]
    fn test_averages_skip_unconverged() {
        let mut discounted = record(0.2, Some(14.0), 3.0);
        discounted.gamma = 0.7;
        let mut stalled = record(0.3, None, 100.0);
        stalled.gamma = 0.1;

        let report = SearchReport::new(
            "random",
            DiceConfig::default(),
            vec![record(0.1, Some(10.0), 1.0), discounted, stalled],
        );

        let avg = report.averages().unwrap();
        assert_eq!(avg.runs, 2);
        assert!((avg.theta - 0.15).abs() < 1e-12);
        assert!((avg.gamma - 0.8).abs() < 1e-12);
        assert_eq!(avg.mean_score, 12.0);
        assert_eq!(avg.solve_seconds, 2.0);
        assert_eq!(avg.play_seconds, 0.5);
        assert_eq!(avg.sweeps, 4.0);
    }

    #[test]
    fn test_save_json() {
        let report = SearchReport::new("grid", DiceConfig::default(), vec![record(0.1, Some(12.5), 1.0)]);
        let path = std::env::temp_dir().join(format!("dice_search_report_{}.json", std::process::id()));

        report.save_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let loaded: SearchReport = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.name, "grid");
        assert_eq!(loaded.records, report.records);
        assert_eq!(loaded.game.dice, 3);
    }
}
