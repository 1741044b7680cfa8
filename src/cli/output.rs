//! Output formatting for CLI commands.

use serde::Serialize;

use crate::cli::args::{OutputFormat, VectoryArgs};
use crate::collection::memory::StoredObject;
use crate::error::Result;
use crate::hybrid::fusion::FusionType;
use crate::hybrid::types::{FusedResult, HybridSearchResults, Payload, SourceRanking};

/// A single keyword or vector search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub rank: usize,
    pub score: f64,
    pub properties: Payload,
}

/// Result structure for single-source searches.
#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub search_type: String,
    pub collection: String,
    pub hits: Vec<SearchHit>,
    pub took_ms: u64,
}

impl SearchResults {
    pub fn from_ranking(
        search_type: &str,
        collection: &str,
        ranking: SourceRanking,
        took_ms: u64,
    ) -> Self {
        let hits = ranking
            .items()
            .iter()
            .map(|item| SearchHit {
                id: item.id.clone(),
                rank: item.rank,
                score: item.raw_score,
                properties: item.payload.clone(),
            })
            .collect();

        Self {
            search_type: search_type.to_string(),
            collection: collection.to_string(),
            hits,
            took_ms,
        }
    }
}

/// Result structure for the filter command.
#[derive(Debug, Serialize)]
pub struct FilterResults {
    pub collection: String,
    pub filter: Payload,
    pub objects: Vec<StoredObject>,
    pub took_ms: u64,
}

/// Result structure for the fuse command.
#[derive(Debug, Serialize)]
pub struct FuseResults {
    pub fusion_type: FusionType,
    pub alpha: f64,
    pub keyword_count: usize,
    pub vector_count: usize,
    pub results: Vec<FusedResult>,
}

/// One line of the human-readable results table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub id: String,
    pub properties: String,
    pub score: Option<f64>,
}

impl TableRow {
    fn new(id: &str, payload: &Payload, score: f64) -> Self {
        Self {
            id: id.to_string(),
            properties: format_properties(payload),
            score: Some(score),
        }
    }

    fn unscored(id: &str, payload: &Payload) -> Self {
        Self {
            id: id.to_string(),
            properties: format_properties(payload),
            score: None,
        }
    }
}

/// Results that can be shown as a table of id, properties and score.
pub trait Tabular {
    /// Whether the table has a score column.
    const SCORED: bool = true;

    fn rows(&self) -> Vec<TableRow>;

    /// Lines printed below the table.
    fn summary(&self) -> Vec<String> {
        Vec::new()
    }
}

impl Tabular for SearchResults {
    fn rows(&self) -> Vec<TableRow> {
        self.hits
            .iter()
            .map(|hit| TableRow::new(&hit.id, &hit.properties, hit.score))
            .collect()
    }

    fn summary(&self) -> Vec<String> {
        vec![
            format!("Total hits: {}", self.hits.len()),
            format!("Search time: {}ms", self.took_ms),
        ]
    }
}

impl Tabular for HybridSearchResults {
    fn rows(&self) -> Vec<TableRow> {
        fused_rows(&self.results)
    }

    fn summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Fusion: {} (alpha {})",
                self.fusion_type.name(),
                self.alpha
            ),
            format!(
                "Keyword matches: {}, vector matches: {}",
                self.keyword_matches, self.vector_matches
            ),
        ];
        if !self.vector_available {
            lines.push("Vector search unavailable; keyword results only".to_string());
        }
        lines.push(format!("Search time: {}ms", self.took_ms));
        lines
    }
}

impl Tabular for FilterResults {
    const SCORED: bool = false;

    fn rows(&self) -> Vec<TableRow> {
        self.objects
            .iter()
            .map(|object| TableRow::unscored(&object.id, &object.properties))
            .collect()
    }

    fn summary(&self) -> Vec<String> {
        vec![
            format!("Filter: {}", format_properties(&self.filter)),
            format!("Matching objects: {}", self.objects.len()),
            format!("Search time: {}ms", self.took_ms),
        ]
    }
}

impl Tabular for FuseResults {
    fn rows(&self) -> Vec<TableRow> {
        fused_rows(&self.results)
    }

    fn summary(&self) -> Vec<String> {
        vec![
            format!("Fusion: {} (alpha {})", self.fusion_type.name(), self.alpha),
            format!(
                "Keyword entries: {}, vector entries: {}",
                self.keyword_count, self.vector_count
            ),
        ]
    }
}

fn fused_rows(results: &[FusedResult]) -> Vec<TableRow> {
    results
        .iter()
        .map(|result| TableRow::new(&result.id, &result.payload, result.fused_score))
        .collect()
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + Tabular>(
    message: &str,
    result: &T,
    args: &VectoryArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Tabular>(message: &str, result: &T, args: &VectoryArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    print!("{}", render_table(&result.rows(), T::SCORED));

    if args.verbosity() > 0 {
        println!();
        for line in result.summary() {
            println!("{line}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &VectoryArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

/// Render rows as an aligned table with a header line. The score column is
/// left out when `scored` is false.
pub fn render_table(rows: &[TableRow], scored: bool) -> String {
    const HEADERS: [&str; 3] = ["id", "properties", "score"];

    let scores: Vec<String> = rows
        .iter()
        .map(|row| row.score.map(format_score).unwrap_or_default())
        .collect();
    let id_width = rows
        .iter()
        .map(|row| row.id.chars().count())
        .fold(HEADERS[0].len(), usize::max);
    let properties_width = rows
        .iter()
        .map(|row| row.properties.chars().count())
        .fold(HEADERS[1].len(), usize::max);
    let score_width = scores
        .iter()
        .map(String::len)
        .fold(HEADERS[2].len(), usize::max);

    let line = |id: &str, properties: &str, score: &str| {
        if scored {
            format!("{id:<id_width$}  {properties:<properties_width$}  {score:>score_width$}\n")
        } else {
            format!("{id:<id_width$}  {}\n", properties.trim_end())
        }
    };

    let mut table = line(HEADERS[0], HEADERS[1], HEADERS[2]);
    table.push_str(&line(
        &"─".repeat(id_width),
        &"─".repeat(properties_width),
        &"─".repeat(score_width),
    ));

    if rows.is_empty() {
        table.push_str("(no results)\n");
    }
    for (row, score) in rows.iter().zip(&scores) {
        table.push_str(&line(&row.id, &row.properties, score));
    }
    table
}

/// Format a score with four decimals.
pub fn format_score(score: f64) -> String {
    format!("{score:.4}")
}

/// Format properties as `name=value` pairs in name order.
pub fn format_properties(payload: &Payload) -> String {
    payload
        .iter()
        .map(|(name, value)| format!("{name}={}", format_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.75), "0.7500");
        assert_eq!(format_score(1.0 / 3.0), "0.3333");
    }

    #[test]
    fn test_format_properties_sorted() {
        let mut payload = Payload::new();
        payload.insert("title".to_string(), json!("Rust"));
        payload.insert("year".to_string(), json!(2024));
        payload.insert("author".to_string(), json!("Ferris"));

        assert_eq!(
            format_properties(&payload),
            "author=Ferris, title=Rust, year=2024"
        );
    }

    #[test]
    fn test_render_table() {
        let mut payload = Payload::new();
        payload.insert("title".to_string(), json!("Search"));
        let rows = vec![
            TableRow::new("B", &payload, 0.75),
            TableRow::new("A", &Payload::new(), 0.5),
        ];

        let table = render_table(&rows, true);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("id"));
        assert!(lines[2].starts_with("B "));
        assert!(lines[2].contains("title=Search"));
        assert!(lines[2].ends_with("0.7500"));
        assert!(lines[3].ends_with("0.5000"));
    }

    #[test]
    fn test_render_empty_table() {
        let table = render_table(&[], true);
        assert!(table.contains("(no results)"));
    }

    #[test]
    fn test_render_unscored_table() {
        let mut payload = Payload::new();
        payload.insert("title".to_string(), json!("Search"));
        let rows = vec![TableRow::unscored("A", &payload)];

        let table = render_table(&rows, false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id  properties");
        assert_eq!(lines[2], "A   title=Search");
        assert!(!table.contains("score"));
    }

    #[test]
    fn test_filter_results_rows() {
        let mut filter = Payload::new();
        filter.insert("lang".to_string(), json!("rust"));
        let results = FilterResults {
            collection: "Articles".to_string(),
            filter,
            objects: vec![StoredObject::new("a").with_property("lang", "rust")],
            took_ms: 0,
        };

        let rows = results.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, None);
        assert_eq!(results.summary()[0], "Filter: lang=rust");
        assert!(!FilterResults::SCORED);
    }

    #[test]
    fn test_search_results_from_ranking() {
        let ranking = SourceRanking::from_scores([("x", 2.0), ("y", 3.0)]).unwrap();
        let results = SearchResults::from_ranking("text", "Articles", ranking, 1);

        assert_eq!(results.hits[0].id, "y");
        assert_eq!(results.hits[0].rank, 1);
        assert_eq!(results.rows().len(), 2);
        assert_eq!(results.summary()[0], "Total hits: 2");
    }
}
