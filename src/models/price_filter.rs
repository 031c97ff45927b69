/// Which price sides (mid/bid/ask) a run requests from the candle API.
///
/// Default is none selected; the CLI requires the operator to pick at least
/// one for useful output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceFilter {
    pub mid: bool,
    pub bid: bool,
    pub ask: bool,
}

impl PriceFilter {
    pub fn new(mid: bool, bid: bool, ask: bool) -> Self {
        Self { mid, bid, ask }
    }

    /// Build the API `price` flag string by prepending in mid, bid, ask
    /// order: all three selected yields "ABM".
    pub fn flag_string(&self) -> String {
        let mut flags = String::new();
        if self.mid {
            flags.insert(0, 'M');
        }
        if self.bid {
            flags.insert(0, 'B');
        }
        if self.ask {
            flags.insert(0, 'A');
        }
        flags
    }

    pub fn is_empty(&self) -> bool {
        !(self.mid || self.bid || self.ask)
    }
}
