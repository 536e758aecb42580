//! End-to-end clearing scenarios through a full relay topology.
//!
//! ```text
//! GreedyMarket <- region <- institution <- facilities
//! ```

use sim_exchange::message::{Direction, Network};
use sim_exchange::topology::{submit, Facility, Relay, Stockpile};
use sim_exchange::types::{CommId, CommodityId, GenericResource, MessageId, Transaction};
use sim_exchange::{AcceptanceRule, GreedyMarket, MarketConfig, MessageError, EPS_KG};

const FUEL: CommodityId = CommodityId(1);

struct World {
    net: Network,
    market: CommId,
    region: CommId,
    inst: CommId,
}

impl World {
    fn new() -> Self {
        Self::with_config(MarketConfig::default())
    }

    fn with_config(config: MarketConfig) -> Self {
        config.validate().unwrap();
        let mut net = Network::new();
        let market = net.add_market(|id| GreedyMarket::with_config(id, FUEL, config));
        let region = net.add_node(Relay::to_market);
        let inst = net.add_node(|id| Relay::new(id, region));
        Self { net, market, region, inst }
    }

    fn facility(&mut self, quality: &str, stock: f64) -> CommId {
        let id = self.net.add_node(Facility::new);
        let mut pile = Stockpile::new(id);
        if stock > 0.0 {
            pile = pile.with_resource(GenericResource::boxed("kg", quality, stock));
        }
        self.net.attach_agent(id, pile).unwrap();
        id
    }

    fn offer(&mut self, from: CommId, quality: &str, quantity: f64) -> MessageId {
        let tx = Transaction::offer(FUEL, GenericResource::boxed("kg", quality, quantity), 1.0);
        submit(&mut self.net, from, self.inst, tx).unwrap()
    }

    fn request(&mut self, from: CommId, quality: &str, quantity: f64) -> MessageId {
        let tx = Transaction::request(FUEL, GenericResource::boxed("kg", quality, quantity), 1.0);
        submit(&mut self.net, from, self.inst, tx).unwrap()
    }

    fn held(&self, id: CommId, quality: &str) -> f64 {
        let like = GenericResource::new("kg", quality, 0.0);
        self.net.agent(id).unwrap().quantity_of(&like)
    }

    fn offer_quantities(&self) -> Vec<f64> {
        let book = self.net.market(self.market).unwrap().offers();
        book.iter().map(|(quantity, _)| quantity).collect()
    }
}

#[test]
fn test_split_fill_reinjects_residual() {
    let mut world = World::new();
    let big = world.facility("leu", 60.0);
    let small = world.facility("leu", 50.0);
    let reactor = world.facility("leu", 0.0);

    world.offer(big, "leu", 60.0);
    world.offer(small, "leu", 50.0);
    world.request(reactor, "leu", 100.0);

    let summary = world.net.resolve_market(world.market).unwrap();
    assert_eq!(summary.requests_accepted, 1);
    assert_eq!(summary.orders_sent, 2);

    let quantities: Vec<f64> = world.net.ledger().records().iter().map(|r| r.quantity()).collect();
    assert_eq!(quantities, vec![60.0, 40.0]);
    for record in world.net.ledger().records() {
        assert_eq!(record.transaction.requester, Some(reactor));
    }
    assert_eq!(world.net.ledger().records()[0].transaction.supplier, Some(big));
    assert_eq!(world.net.ledger().records()[1].transaction.supplier, Some(small));

    assert_eq!(world.held(reactor, "leu"), 100.0);
    assert_eq!(world.held(big, "leu"), 0.0);
    assert_eq!(world.held(small, "leu"), 10.0);
    assert_eq!(world.offer_quantities(), vec![10.0]);
}

#[test]
fn test_exact_fill_leaves_no_residual() {
    let mut world = World::new();
    let mine = world.facility("leu", 30.0);
    let reactor = world.facility("leu", 0.0);

    world.offer(mine, "leu", 30.0);
    world.request(reactor, "leu", 30.0);

    let summary = world.net.resolve_market(world.market).unwrap();
    assert_eq!(summary.requests_accepted, 1);
    assert_eq!(summary.orders_sent, 1);
    assert_eq!(world.net.ledger().len(), 1);
    assert_eq!(world.net.ledger().records()[0].quantity(), 30.0);
    assert!(world.offer_quantities().is_empty());
    assert_eq!(world.net.live_messages(), 0);
}

#[test]
fn test_insufficient_supply_rolls_back() {
    let mut world = World::new();
    let a = world.facility("leu", 50.0);
    let b = world.facility("leu", 30.0);
    let reactor = world.facility("leu", 0.0);

    let offer_a = world.offer(a, "leu", 50.0);
    let offer_b = world.offer(b, "leu", 30.0);
    world.request(reactor, "leu", 100.0);
    let before = world.net.market(world.market).unwrap().offers().snapshot();

    let summary = world.net.resolve_market(world.market).unwrap();
    assert_eq!(summary.requests_rejected, 1);
    assert_eq!(summary.orders_sent, 0);
    assert!(world.net.ledger().is_empty());

    assert_eq!(world.net.market(world.market).unwrap().offers().snapshot(), before);
    for offer in [offer_a, offer_b] {
        let msg = world.net.message(offer).unwrap();
        assert_eq!(msg.transaction().requester, None);
        assert_eq!(msg.direction(), Direction::Up);
    }
    assert_eq!(world.held(a, "leu"), 50.0);
}

#[test]
fn test_incompatible_quality_rejected() {
    let mut world = World::new();
    let enricher = world.facility("heu", 500.0);
    let reactor = world.facility("leu", 0.0);

    world.offer(enricher, "heu", 500.0);
    world.request(reactor, "leu", 100.0);

    let summary = world.net.resolve_market(world.market).unwrap();
    assert_eq!(summary.requests_rejected, 1);
    assert!(world.net.ledger().is_empty());
    assert_eq!(world.offer_quantities(), vec![500.0]);
}

#[test]
fn test_largest_request_served_first() {
    let mut world = World::new();
    let mine = world.facility("leu", 80.0);
    let small_reactor = world.facility("leu", 0.0);
    let large_reactor = world.facility("leu", 0.0);

    world.offer(mine, "leu", 80.0);
    world.request(small_reactor, "leu", 30.0);
    world.request(large_reactor, "leu", 70.0);

    let summary = world.net.resolve_market(world.market).unwrap();
    assert_eq!(summary.requests_accepted, 1);
    assert_eq!(summary.requests_rejected, 1);
    assert_eq!(world.held(large_reactor, "leu"), 70.0);
    assert_eq!(world.held(small_reactor, "leu"), 0.0);
    assert_eq!(world.offer_quantities(), vec![10.0]);
}

#[test]
fn test_residual_serves_later_request_in_same_pass() {
    let mut world = World::new();
    let mine = world.facility("leu", 100.0);
    let first = world.facility("leu", 0.0);
    let second = world.facility("leu", 0.0);

    world.offer(mine, "leu", 100.0);
    world.request(first, "leu", 60.0);
    world.request(second, "leu", 40.0);

    let summary = world.net.resolve_market(world.market).unwrap();
    assert_eq!(summary.requests_accepted, 2);
    assert_eq!(summary.orders_sent, 2);
    assert_eq!(world.held(first, "leu"), 60.0);
    assert_eq!(world.held(second, "leu"), 40.0);
    assert!(world.offer_quantities().is_empty());
}

#[test]
fn test_tiny_request_follows_acceptance_rule() {
    let tiny = EPS_KG / 4.0;

    let mut strict = World::new();
    let reactor = strict.facility("leu", 0.0);
    strict.request(reactor, "leu", tiny);
    assert_eq!(strict.net.resolve_market(strict.market).unwrap().requests_rejected, 1);

    let config = MarketConfig::new().with_acceptance(AcceptanceRule::WithinTolerance);
    let mut lenient = World::with_config(config);
    let reactor = lenient.facility("leu", 0.0);
    lenient.request(reactor, "leu", tiny);
    let summary = lenient.net.resolve_market(lenient.market).unwrap();
    assert_eq!(summary.requests_accepted, 1);
    assert_eq!(summary.orders_sent, 0);
}

#[test]
fn test_supplier_without_stock_aborts_settlement() {
    let mut world = World::new();
    let bluffer = world.facility("leu", 0.0);
    let reactor = world.facility("leu", 0.0);

    world.offer(bluffer, "leu", 20.0);
    world.request(reactor, "leu", 20.0);

    let err = world.net.resolve_market(world.market).unwrap_err();
    assert!(matches!(err, MessageError::Shortfall { agent, .. } if agent == bluffer));
    assert!(world.net.ledger().is_empty());
    assert_eq!(world.net.live_messages(), 0);
}

#[test]
fn test_failed_supplier_keeps_later_offers_available() {
    let mut world = World::new();
    let bluffer = world.facility("leu", 0.0);
    let honest = world.facility("leu", 40.0);
    let reactor = world.facility("leu", 0.0);

    world.offer(bluffer, "leu", 60.0);
    world.offer(honest, "leu", 40.0);
    world.request(reactor, "leu", 100.0);

    let err = world.net.resolve_market(world.market).unwrap_err();
    assert!(matches!(err, MessageError::Shortfall { agent, .. } if agent == bluffer));
    assert_eq!(world.offer_quantities(), vec![40.0]);
    assert_eq!(world.net.live_messages(), 1);
    assert_eq!(world.held(honest, "leu"), 40.0);

    world.request(reactor, "leu", 40.0);
    let summary = world.net.resolve_market(world.market).unwrap();
    assert_eq!(summary.requests_accepted, 1);
    assert_eq!(world.held(reactor, "leu"), 40.0);
    assert_eq!(world.net.ledger().records()[0].transaction.supplier, Some(honest));
}

#[test]
fn test_relays_forget_messages_that_leave_the_book() {
    let mut world = World::new();
    let mine = world.facility("leu", 100.0);
    let enricher = world.facility("heu", 5.0);
    let reactor = world.facility("leu", 0.0);

    let split = world.offer(mine, "leu", 100.0);
    let waiting = world.offer(enricher, "heu", 5.0);
    let request = world.request(reactor, "leu", 60.0);
    for relay in [world.region, world.inst] {
        assert_eq!(world.net.tracked_count(relay), Some(3));
        assert!(world.net.is_tracked_by(relay, request));
    }

    world.net.resolve_market(world.market).unwrap();
    assert!(!world.net.contains_message(split));
    assert!(!world.net.contains_message(request));
    for relay in [world.region, world.inst] {
        assert!(!world.net.is_tracked_by(relay, request));
        assert!(!world.net.is_tracked_by(relay, split));
        // the unmatched offer is still on its way
        assert!(world.net.is_tracked_by(relay, waiting));
        assert_eq!(world.net.tracked_count(relay), Some(1));
    }
}

#[test]
fn test_resolve_all_markets() {
    let mut world = World::new();
    let other = world.net.add_market(|id| GreedyMarket::new(id, CommodityId(2)));
    let mine = world.facility("leu", 10.0);
    let reactor = world.facility("leu", 0.0);
    world.offer(mine, "leu", 10.0);
    world.request(reactor, "leu", 10.0);

    let results = world.net.resolve_markets().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, world.market);
    assert_eq!(results[0].1.requests_accepted, 1);
    assert_eq!(results[1].0, other);
    assert!(results[1].1.is_empty());
}
