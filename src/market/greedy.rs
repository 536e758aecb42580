//! Greedy largest-first clearing market.
//!
//! ## Algorithm
//!
//! Offers and requests are buffered by quantity as they arrive. A
//! resolution pass then repeatedly takes the largest request and fills it
//! from the largest compatible offers:
//!
//! ```text
//! request 100, offers {60, 50}
//!
//!   take 60:  100 - 60 > eps    -> whole offer becomes an order, 40 left
//!   take 50:   40 - 50 <= eps   -> split: order of 40, residual offer of 10
//!
//!   orders = [60, 40]   offers = {10}   request accepted
//! ```
//!
//! ## Commit and Rollback
//!
//! `orders` is a log shared by the whole pass; `firm_orders` marks how much
//! of it belongs to accepted requests. A rejected request truncates the log
//! back to `firm_orders` and returns every offer it consumed to the book at
//! its original quantity, so a rejection leaves the offer book as it found
//! it. Residual offers re-injected by a split are the one exception: they
//! stay in the book.
//!
//! ## Settlement
//!
//! Once every request has been tried, each firm order is turned around and
//! sent back down the path its offer came up, ending at the supplier. If a
//! supplier cannot deliver, its order is dropped and the orders behind it
//! return to the offer book.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::config::MarketConfig;
use crate::error::MessageError;
use crate::market::{OrderBook, ResolveSummary};
use crate::message::{Communicator, Direction, Market, Network};
use crate::types::quantity::exceeds;
use crate::types::{CommId, CommodityId, MessageId};

/// Offer consumed while matching the current request.
#[derive(Debug, Clone, Copy)]
struct MatchedOffer {
    /// Book key the offer was popped at.
    quantity: f64,
    message: MessageId,
    /// Requester before the match, restored on rollback.
    requester: Option<CommId>,
    /// Only a clone of the offer went into `orders`.
    split: bool,
}

/// Market that clears largest requests against largest offers.
///
/// ## Example
///
/// ```
/// use sim_exchange::market::GreedyMarket;
/// use sim_exchange::message::{Market, Network};
/// use sim_exchange::types::CommodityId;
///
/// let mut net = Network::new();
/// let market = net.add_market(|id| GreedyMarket::new(id, CommodityId(1)));
///
/// assert_eq!(net.market_for(CommodityId(1)), Some(market));
/// let summary = net.resolve_market(market).unwrap();
/// assert!(summary.is_empty());
/// ```
#[derive(Debug)]
pub struct GreedyMarket {
    id: CommId,
    commodity: CommodityId,
    config: MarketConfig,

    /// Messages delivered to or routed through this market.
    tracked: BTreeSet<MessageId>,

    offers: OrderBook,
    requests: OrderBook,

    /// Pending commit log for the current pass.
    orders: Vec<MessageId>,

    /// Offers consumed by the request being matched.
    matched_offers: Vec<MatchedOffer>,

    /// Incompatible offers popped by the request being matched.
    skipped_offers: Vec<(f64, MessageId)>,

    /// Prefix of `orders` committed by accepted requests.
    firm_orders: usize,
}

impl GreedyMarket {
    /// Market for `commodity` with the default configuration.
    pub fn new(id: CommId, commodity: CommodityId) -> Self {
        Self::with_config(id, commodity, MarketConfig::default())
    }

    /// Market for `commodity` with `config`.
    ///
    /// `config` is taken as given; run [`MarketConfig::validate`] first when
    /// it comes from user input.
    pub fn with_config(id: CommId, commodity: CommodityId, config: MarketConfig) -> Self {
        Self {
            id,
            commodity,
            orders: Vec::with_capacity(config.order_capacity),
            matched_offers: Vec::new(),
            skipped_offers: Vec::new(),
            tracked: BTreeSet::new(),
            offers: OrderBook::new(),
            requests: OrderBook::new(),
            firm_orders: 0,
            config,
        }
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Fill `request` from the offer book.
    ///
    /// Orders produced here are tentative until [`Self::commit_request`]
    /// or [`Self::reject_request`] runs.
    ///
    /// # Arguments
    ///
    /// * `request` - Request being matched
    /// * `quantity` - Book key the request was popped at
    ///
    /// # Returns
    ///
    /// `true` if the request is accepted under the configured
    /// [`AcceptanceRule`](crate::config::AcceptanceRule).
    fn match_request(&mut self, net: &mut Network, request: MessageId, quantity: f64) -> Result<bool, MessageError> {
        let (wanted, requester) = {
            let msg = net.message(request)?;
            (msg.resource()?.clone_resource(), msg.requester()?)
        };
        let eps = self.config.eps_kg;
        let mut remaining = quantity;

        while remaining.abs() > eps {
            let Some((offer_quantity, offer)) = self.offers.pop_largest() else {
                break;
            };

            let previous = {
                let msg = net.message(offer)?;
                if !wanted.check_quality(msg.resource()?) {
                    debug!(market = %self.id, offer = %offer, request = %request, "offer quality incompatible");
                    self.skipped_offers.push((offer_quantity, offer));
                    continue;
                }
                msg.transaction().requester
            };
            let split = !exceeds(remaining, offer_quantity, eps);
            self.matched_offers.push(MatchedOffer {
                quantity: offer_quantity,
                message: offer,
                requester: previous,
                split,
            });

            if !split {
                net.message_mut(offer)?.set_requester(requester);
                self.orders.push(offer);
                remaining -= offer_quantity;
                debug!(market = %self.id, offer = %offer, quantity = offer_quantity, remaining, "offer fully consumed");
                continue;
            }

            let order = net.clone_message(offer)?;
            {
                let msg = net.message_mut(order)?;
                msg.resource_mut()?.set_quantity(remaining);
                msg.set_requester(requester);
            }
            self.orders.push(order);
            debug!(market = %self.id, offer = %offer, order = %order, quantity = remaining, "offer split");

            let leftover = offer_quantity - remaining;
            if leftover > eps {
                let residual = net.clone_message(offer)?;
                net.message_mut(residual)?.resource_mut()?.set_quantity(leftover);
                debug!(market = %self.id, residual = %residual, quantity = leftover, "residual offer re-injected");
                self.receive_message(net, residual)?;
            }
            remaining = 0.0;
        }

        let accepted = self.config.acceptance.accepts(remaining, eps);
        if !accepted {
            debug!(market = %self.id, request = %request, remaining, "request not filled");
        }
        Ok(accepted)
    }

    /// Make the current request's orders permanent.
    fn commit_request(&mut self, net: &mut Network) {
        self.firm_orders = self.orders.len();
        for matched in self.matched_offers.drain(..) {
            self.tracked.remove(&matched.message);
            // only the clones of a split offer travel on
            if matched.split {
                net.retire(matched.message);
            }
        }
    }

    /// Undo the current request's matching.
    fn reject_request(&mut self, net: &mut Network) -> Result<(), MessageError> {
        let firm = self.firm_orders;
        for order in self.orders.drain(firm..) {
            if !self.matched_offers.iter().any(|m| m.message == order) {
                net.retire(order);
            }
        }
        for matched in self.matched_offers.drain(..) {
            net.message_mut(matched.message)?.transaction_mut().requester = matched.requester;
            self.offers.insert(matched.quantity, matched.message);
        }
        Ok(())
    }

    fn restore_skipped(&mut self) {
        for (quantity, offer) in self.skipped_offers.drain(..) {
            self.offers.insert(quantity, offer);
        }
    }

    /// Send every order down toward its supplier.
    ///
    /// If an order fails on the way down, the orders not yet sent go back
    /// to the offer book as offers before the error is returned.
    ///
    /// # Returns
    ///
    /// Number of orders sent.
    fn settle(&mut self, net: &mut Network) -> Result<u64, MessageError> {
        let orders = std::mem::take(&mut self.orders);
        self.firm_orders = 0;

        let mut sent = 0;
        let mut pending = orders.into_iter();
        while let Some(order) = pending.next() {
            if let Err(err) = self.send_order(net, order) {
                warn!(market = %self.id, order = %order, error = %err, "settlement failed");
                for unsent in pending.by_ref() {
                    self.return_order(net, unsent)?;
                }
                return Err(err);
            }
            sent += 1;
        }
        Ok(sent)
    }

    /// Route one order down and retire it, whatever the outcome.
    fn send_order(&mut self, net: &mut Network, order: MessageId) -> Result<(), MessageError> {
        net.message_mut(order)?.set_direction(Direction::Down);
        let result = net.send_on(order, self);
        self.tracked.remove(&order);
        net.retire(order);
        result
    }

    /// Put an unsent order back in the offer book, unclaimed.
    fn return_order(&mut self, net: &mut Network, order: MessageId) -> Result<(), MessageError> {
        let quantity = {
            let msg = net.message_mut(order)?;
            msg.transaction_mut().requester = None;
            msg.quantity()?
        };
        self.offers.insert(quantity, order);
        self.tracked.insert(order);
        debug!(market = %self.id, order = %order, quantity, "unsent order returned to the book");
        Ok(())
    }
}

impl Communicator for GreedyMarket {
    fn id(&self) -> CommId {
        self.id
    }

    /// Buffer an offer or request under its resource quantity.
    fn receive_message(&mut self, net: &mut Network, msg: MessageId) -> Result<(), MessageError> {
        let (quantity, is_offer) = {
            let m = net.message(msg)?;
            (m.quantity()?, m.is_offer())
        };
        self.tracked.insert(msg);
        if is_offer {
            self.offers.insert(quantity, msg);
        } else {
            self.requests.insert(quantity, msg);
        }
        debug!(market = %self.id, message = %msg, quantity, offer = is_offer, "message buffered");
        Ok(())
    }

    fn track_message(&mut self, msg: MessageId) {
        self.tracked.insert(msg);
    }

    fn untrack_message(&mut self, msg: MessageId) {
        self.tracked.remove(&msg);
    }

    fn is_tracking(&self, msg: MessageId) -> bool {
        self.tracked.contains(&msg)
    }

    fn tracked_count(&self) -> usize {
        self.tracked.len()
    }
}

impl Market for GreedyMarket {
    fn commodity(&self) -> CommodityId {
        self.commodity
    }

    fn resolve(&mut self, net: &mut Network) -> Result<ResolveSummary, MessageError> {
        let mut summary = ResolveSummary::default();
        self.firm_orders = 0;

        while let Some((quantity, request)) = self.requests.pop_largest() {
            if self.match_request(net, request, quantity)? {
                self.commit_request(net);
                summary.requests_accepted += 1;
                summary.quantity_cleared += quantity;
            } else {
                self.reject_request(net)?;
                summary.requests_rejected += 1;
            }
            self.restore_skipped();
            self.tracked.remove(&request);
            net.retire(request);
        }

        summary.orders_sent = self.settle(net)?;
        info!(
            market = %self.id,
            commodity = %self.commodity,
            accepted = summary.requests_accepted,
            rejected = summary.requests_rejected,
            orders = summary.orders_sent,
            "market resolved"
        );
        Ok(summary)
    }

    fn offers(&self) -> &OrderBook {
        &self.offers
    }

    fn requests(&self) -> &OrderBook {
        &self.requests
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
