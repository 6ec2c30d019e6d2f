// THEORY:
// The `report` module turns the harness's ordered `PerformanceRecord`s into the
// console table the batch runner prints. It only reads records; it never times or
// filters anything itself. The chart in `chart` draws from the same records.

use crate::benchmark::PerformanceRecord;

/// Renders records as a tab-separated table, one row per image, in record order.
pub fn render_table(records: &[PerformanceRecord]) -> String {
    let mut table = String::new();
    table.push_str("Image\tSequential Time (s)\tParallel Time (s)\tSpeedup\n");
    table.push_str("------------------------------------------------------------\n");

    for record in records {
        let speedup = match record.speedup() {
            Some(ratio) => format!("{ratio:.2}x"),
            None => "-".to_string(),
        };
        table.push_str(&format!(
            "{}\t{:.6}\t\t{:.6}\t\t{}\n",
            record.image_id(),
            record.sequential().as_secs_f64(),
            record.parallel().as_secs_f64(),
            speedup,
        ));
    }

    table
}
