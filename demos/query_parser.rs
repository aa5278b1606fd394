//! Query parser example - parses query strings and prints their canonical form.
//!
//! Pass queries as arguments, or run without arguments to see a few samples:
//!
//! ```text
//! cargo run --example query_parser -- 'title:(dog cat) -bird^0.5'
//! ```

use std::env;
use std::sync::Arc;

use aqp::analysis::{Analyzer, KeywordAnalyzer, PerFieldAnalyzer, StandardAnalyzer};
use aqp::{DefaultOperator, ParserConfig, QueryParser, Result, render};

fn main() -> Result<()> {
    println!("=== Query Parser Example ===\n");

    // Create an analyzer: keyword for ids, standard for everything else
    let standard_analyzer: Arc<dyn Analyzer> = Arc::new(StandardAnalyzer::new());
    let keyword_analyzer: Arc<dyn Analyzer> = Arc::new(KeywordAnalyzer::new());
    let mut per_field_analyzer = PerFieldAnalyzer::new(Arc::clone(&standard_analyzer));
    per_field_analyzer.add_analyzer("id", Arc::clone(&keyword_analyzer));

    // Create the parser
    let config = ParserConfig::builder()
        .default_operator(DefaultOperator::And)
        .max_clause_count(64)
        .build();
    let parser = QueryParser::with_config(Arc::new(per_field_analyzer), config)?;

    let mut queries: Vec<String> = env::args().skip(1).collect();
    if queries.is_empty() {
        queries = [
            "+title:(dog cat)",
            "one OR two NOT three",
            "id:AB-12 \"Quick Brown Fox\"~2",
            "term~ te?t* [alpha TO omega}",
            "this (+(-(+(-(that thus))^0.1))^0.3)",
            "(unbalanced",
        ]
        .into_iter()
        .map(String::from)
        .collect();
    }

    for query in &queries {
        println!("query:    {query}");
        match parser.parse_with_trace(query, "body") {
            Ok(output) => {
                println!("rendered: {}", render(&output.query));
                println!("syntax tree:\n{}", output.trace);
            }
            Err(e) => println!("error:    {e}\n"),
        }
    }

    Ok(())
}
