/// A predicate over a record's payload fields (or the special `_id` field).
///
/// Evaluated by `chronostore-core` against the decoded payload; never against raw bytes.
/// The temporal visibility filter (lookup-list membership, revision cutoff, imports
/// cutoff, tombstone masking) is composed on top of whatever `Predicate` the caller
/// supplies — it is not itself expressible as a `Predicate` and cannot be weakened by one.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq(String, serde_json::Value),
    In(String, Vec<serde_json::Value>),
    And(Vec<Predicate>),
    Lt(String, serde_json::Value),
    Gt(String, serde_json::Value),
}

/// Ordering is restricted to `_id`, ascending or descending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderBy {
    IdAsc,
    IdDesc,
}

/// A composable query over one record class within one dataset lookup scope.
#[derive(Clone, Debug, Default)]
pub struct Query {
    predicate: Option<Predicate>,
    order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Query {
        Query::default()
    }

    /// ANDs `p` onto any predicate already present.
    pub fn filter(mut self, p: Predicate) -> Query {
        self.predicate = Some(match self.predicate.take() {
            None => p,
            Some(Predicate::And(mut existing)) => {
                existing.push(p);
                Predicate::And(existing)
            }
            Some(existing) => Predicate::And(vec![existing, p]),
        });
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Query {
        self.order_by = Some(order);
        self
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn order(&self) -> Option<OrderBy> {
        self.order_by
    }
}
