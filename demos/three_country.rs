//! Nested centers of a small three-country network.
//!
//! ```bash
//! RUST_LOG=cpnet=debug cargo run --example three_country
//! ```

use cpnet::country::{INCOME, PROPENSITY};
use cpnet::{analyze, AnalysisConfig, GraphDocument, TradeGraph};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("cpnet=info".parse()?),
        )
        .init();

    // Absolute import flows (importer -> exporter).
    let mut g = TradeGraph::new();
    g.add_flow("ARG", "BRA", 30.0);
    g.add_flow("ARG", "CHL", 30.0);
    g.add_flow("BRA", "ARG", 12.0);
    g.add_flow("CHL", "ARG", 7.0);
    for (id, income) in [("ARG", 100.0), ("BRA", 50.0), ("CHL", 50.0)] {
        g.set_attribute(id, PROPENSITY, 0.2);
        g.set_attribute(id, INCOME, income);
    }

    let analysis = analyze(&g, &AnalysisConfig::default())?;

    println!("Elasticity matrix:");
    let order = analysis.elasticity.order();
    for from in order.iter() {
        let row: Vec<String> = order
            .iter()
            .map(|to| format!("{:.5}", analysis.elasticity.get(from, to).unwrap_or(0.0)))
            .collect();
        println!("  {from}: [{}]", row.join(", "));
    }

    println!("\nNested centers:");
    for level in analysis.partition.iter() {
        println!(
            "  level {}: {:?} (power balance {:.6})",
            level.level, level.nodes, level.power_balance
        );
    }
    println!("  periphery: {:?}", analysis.partition.remaining);

    println!("\nInfluence graph (NetworkX JSON):");
    println!(
        "{}",
        GraphDocument::from_influence_graph(&analysis.influence).to_networkx_json()?
    );
    Ok(())
}
