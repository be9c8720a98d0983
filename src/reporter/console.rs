use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};

use crate::Result;
use crate::assertion::AssertionResult;
use crate::reporter::state::ReportSink;
use crate::runner::{TestResult, TestSummary};

/// 终端输出：每个用例一行，结束时打印摘要
pub struct ConsoleReporter {
    verbose: bool,
    results: Vec<TestResult>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            results: Vec::new(),
        }
    }

    /// 打印单个测试结果
    pub fn print_result(&self, result: &TestResult) {
        if result.is_skipped() {
            println!(
                " {} [{}] {} - {} {} {}",
                "⊘".dimmed(),
                result.case_number,
                result.name,
                result.method.cyan(),
                result.url,
                "(skipped)".dimmed()
            );
            return;
        }

        let symbol = if result.passed() {
            "✓".green()
        } else {
            "✗".red()
        };

        let status = result
            .status
            .map(|s| format!(" -> {}", s))
            .unwrap_or_default();

        println!(
            " {} [{}] {} - {} {}{} ({}ms)",
            symbol,
            result.case_number,
            result.name,
            result.method.cyan(),
            result.url,
            status,
            result.duration.as_millis()
        );

        if let Some(error) = &result.error
            && result.assertions.iter().all(|a| a.passed)
        {
            println!("   {}: {}", "Error".red().bold(), error);
            println!();
        }

        // verbose 显示全部断言，否则只显示失败的
        let shown: Vec<&AssertionResult> = result
            .assertions
            .iter()
            .filter(|a| self.verbose || !a.passed)
            .collect();

        if !shown.is_empty() {
            println!("   Assertions:");
            for assertion in shown {
                if assertion.passed {
                    println!("     {} {}", "✓".green(), assertion.raw);
                } else {
                    println!("     {} {}", "✗".red(), assertion.raw);
                    if let Some(msg) = &assertion.message {
                        println!("       {}", msg.red());
                    }
                }
            }
            println!();
        }
    }

    /// 打印 suite 开始
    pub fn print_header(&self, suite: &str, total: usize) {
        println!("\nRunning {} cases from {}...\n", total, suite.bold());
    }

    /// 按 suite 汇总的表格
    fn suite_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Suite", "Passed", "Failed", "Skipped", "Duration"]);

        let mut suites: Vec<&str> = Vec::new();
        for result in &self.results {
            if !suites.contains(&result.suite.as_str()) {
                suites.push(&result.suite);
            }
        }

        for suite in suites {
            let results: Vec<TestResult> = self
                .results
                .iter()
                .filter(|r| r.suite == suite)
                .cloned()
                .collect();
            let summary = TestSummary::from_results(&results);
            let failed_color = if summary.failed == 0 {
                Color::Green
            } else {
                Color::Red
            };

            table.add_row(vec![
                Cell::new(suite),
                Cell::new(summary.passed).fg(Color::Green),
                Cell::new(summary.failed).fg(failed_color),
                Cell::new(summary.skipped),
                Cell::new(format!("{}ms", summary.total_duration.as_millis())),
            ]);
        }

        table
    }

    /// 打印测试摘要
    pub fn print_summary(&self, summary: &TestSummary) {
        println!("\n{}", "━".repeat(50));
        println!("{}", "Summary".bold());
        println!("{}", "━".repeat(50));

        if !self.results.is_empty() {
            println!("{}", self.suite_table());
        }

        if summary.skipped > 0 {
            println!(
                "  {}: {} passed, {} failed, {} skipped, {} total",
                "Tests".bold(),
                summary.passed.to_string().green(),
                summary.failed.to_string().red(),
                summary.skipped.to_string().dimmed(),
                summary.total
            );
        } else if summary.failed == 0 {
            println!(
                "  {}: {} passed, {} total",
                "Tests".bold(),
                summary.passed.to_string().green(),
                summary.total
            );
        } else {
            println!(
                "  {}: {} passed, {} failed, {} total",
                "Tests".bold(),
                summary.passed.to_string().green(),
                summary.failed.to_string().red(),
                summary.total
            );
        }

        // 显示断言统计
        if summary.total_assertions > 0 {
            if summary.failed_assertions == 0 {
                println!(
                    "  {}: {} passed, {} total",
                    "Assertions".bold(),
                    summary.passed_assertions.to_string().green(),
                    summary.total_assertions
                );
            } else {
                println!(
                    "  {}: {} passed, {} failed, {} total",
                    "Assertions".bold(),
                    summary.passed_assertions.to_string().green(),
                    summary.failed_assertions.to_string().red(),
                    summary.total_assertions
                );
            }
        }

        println!(
            "  {}: {:.3}s",
            "Duration".bold(),
            summary.total_duration.as_secs_f64()
        );
        println!();
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ReportSink for ConsoleReporter {
    fn on_suite_start(&mut self, suite: &str, total: usize) {
        self.print_header(suite, total);
    }

    // 断言在 on_test 中随用例一起打印
    fn on_assertion(&mut self, _test_name: &str, _result: &AssertionResult) {}

    fn on_test(&mut self, result: &TestResult) {
        self.print_result(result);
        self.results.push(result.clone());
    }

    fn end(&mut self) -> Result<()> {
        let summary = TestSummary::from_results(&self.results);
        self.print_summary(&summary);
        Ok(())
    }
}
