//! Bus chains across dismissal tiers

/// One (school, route) segment of a bus's afternoon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    pub school: String,
    /// Index into the school's route list
    pub route: usize,
    /// Tier the school dismisses in
    pub tier: u8,
    /// Travel and service seconds up to and including this leg
    pub duration: u64,
}

/// The whole fleet; bus ids are indices into `chains`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fleet {
    chains: Vec<Vec<Leg>>,
}

impl Fleet {
    pub fn new(size: usize) -> Self {
        Self {
            chains: vec![Vec::new(); size],
        }
    }

    pub fn size(&self) -> usize {
        self.chains.len()
    }

    pub fn chain(&self, bus: usize) -> &[Leg] {
        &self.chains[bus]
    }

    pub fn chains(&self) -> impl Iterator<Item = (usize, &[Leg])> {
        self.chains.iter().enumerate().map(|(bus, legs)| (bus, legs.as_slice()))
    }

    pub fn last_leg(&self, bus: usize) -> Option<&Leg> {
        self.chains[bus].last()
    }

    pub fn last_leg_mut(&mut self, bus: usize) -> Option<&mut Leg> {
        self.chains[bus].last_mut()
    }

    pub fn push_leg(&mut self, bus: usize, leg: Leg) {
        self.chains[bus].push(leg);
    }

    /// Lowest-index bus that has not been used at all
    pub fn first_fresh_bus(&self) -> Option<usize> {
        self.chains.iter().position(Vec::is_empty)
    }

    /// Buses that never received a leg
    pub fn idle_buses(&self) -> usize {
        self.chains.iter().filter(|legs| legs.is_empty()).count()
    }

    /// Buses whose most recent leg is in `tier`, in bus-index order
    pub fn buses_ending_in(&self, tier: u8) -> Vec<usize> {
        self.chains
            .iter()
            .enumerate()
            .filter(|(_, legs)| legs.last().is_some_and(|leg| leg.tier == tier))
            .map(|(bus, _)| bus)
            .collect()
    }
}
