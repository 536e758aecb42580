//! sim-exchange - demonstration binary
//!
//! Builds a small region with two suppliers and one buyer, runs one market
//! pass and prints the resulting ledger. Set `RUST_LOG=debug` to follow
//! every hop.

use std::error::Error;

use sim_exchange::message::Network;
use sim_exchange::topology::{submit, Facility, Relay, Stockpile};
use sim_exchange::types::{CommodityId, GenericResource, Transaction};
use sim_exchange::{GreedyMarket, MarketConfig};
use tracing_subscriber::EnvFilter;

const URANIUM: CommodityId = CommodityId(1);

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("===========================================");
    println!("  sim-exchange - greedy market demo");
    println!("===========================================");
    println!();

    let config = MarketConfig::default();
    config.validate()?;

    let mut net = Network::new();
    let market = net.add_market(|id| GreedyMarket::with_config(id, URANIUM, config));
    let region = net.add_node(Relay::to_market);
    let inst = net.add_node(|id| Relay::new(id, region));

    let mine = net.add_node(Facility::new);
    let mill = net.add_node(Facility::new);
    let reactor = net.add_node(Facility::new);
    net.attach_agent(mine, Stockpile::new(mine).with_resource(GenericResource::boxed("kg", "uox", 60.0)))?;
    net.attach_agent(mill, Stockpile::new(mill).with_resource(GenericResource::boxed("kg", "uox", 50.0)))?;
    net.attach_agent(reactor, Stockpile::new(reactor))?;

    submit(&mut net, mine, inst, Transaction::offer(URANIUM, GenericResource::boxed("kg", "uox", 60.0), 1.0))?;
    submit(&mut net, mill, inst, Transaction::offer(URANIUM, GenericResource::boxed("kg", "uox", 50.0), 1.0))?;
    submit(&mut net, reactor, inst, Transaction::request(URANIUM, GenericResource::boxed("kg", "uox", 100.0), 1.0))?;

    for (id, summary) in net.resolve_markets()? {
        println!("Market {}: {} ({:.0}% accepted)", id, summary, summary.acceptance_rate() * 100.0);
    }
    if let Some(book) = net.market(market) {
        let offers = book.offers();
        println!(
            "  open offers: {} at {} quantities, {:.3} kg",
            offers.len(),
            offers.level_count(),
            offers.total_quantity()
        );
    }
    println!();

    println!("Ledger:");
    for record in net.ledger().records() {
        println!(
            "  #{} {} -> {}: {:.3} kg",
            record.id,
            record.transaction.supplier.map_or("?".to_string(), |s| s.to_string()),
            record.transaction.requester.map_or("?".to_string(), |r| r.to_string()),
            record.quantity()
        );
    }
    println!("  moved:  {:.3} kg", net.ledger().total_quantity());
    println!("  digest: {}", net.ledger().digest_hex()?);

    Ok(())
}
