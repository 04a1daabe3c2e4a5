//! Team distribution.
//!
//! Hands out team labels to joining players so teams stay balanced. The
//! candidate teams are whatever the arena's spawnpoints reference; an arena
//! with no team-tagged spawnpoints has no teams and every player stays
//! [`Team::None`].

use std::collections::{HashMap, VecDeque};

use skirmish_types::Team;

/// Round-robin team allocator that favours the least-populated team.
///
/// Ties are broken by queue position: the front of the queue is the team
/// that was assigned least recently (or recycled most recently).
#[derive(Debug, Clone, Default)]
pub struct TeamDistributor {
    queue: VecDeque<Team>,
    population: HashMap<Team, usize>,
}

impl TeamDistributor {
    pub fn new(teams: impl IntoIterator<Item = Team>) -> Self {
        let mut distributor = Self::default();
        distributor.refresh(teams);
        distributor
    }

    /// Replaces the candidate team set.
    ///
    /// Teams that remain keep their population and queue position; new
    /// teams join at the back; vanished teams are forgotten.
    pub fn refresh(&mut self, teams: impl IntoIterator<Item = Team>) {
        let wanted: Vec<Team> = teams.into_iter().filter(Team::is_assignable).collect();
        self.queue.retain(|t| wanted.contains(t));
        self.population.retain(|t, _| wanted.contains(t));
        for team in wanted {
            if !self.queue.contains(&team) {
                self.queue.push_back(team);
                self.population.insert(team, 0);
            }
        }
    }

    /// Assigns the next team, or `None` if the arena has no teams.
    pub fn next(&mut self) -> Option<Team> {
        let (index, _) = self
            .queue
            .iter()
            .enumerate()
            .min_by_key(|(i, team)| (self.population.get(*team).copied().unwrap_or(0), *i))?;
        let team = self.queue.remove(index)?;
        self.queue.push_back(team);
        *self.population.entry(team).or_insert(0) += 1;
        Some(team)
    }

    /// Hands a team back as a player leaves. The team moves to the front of
    /// the queue so it is reused first.
    pub fn recycle(&mut self, team: Team) {
        let Some(index) = self.queue.iter().position(|t| *t == team) else {
            return;
        };
        if let Some(count) = self.population.get_mut(&team) {
            *count = count.saturating_sub(1);
        }
        if let Some(team) = self.queue.remove(index) {
            self.queue.push_front(team);
        }
    }

    /// Candidate teams in queue order.
    pub fn teams(&self) -> impl Iterator<Item = Team> + '_ {
        self.queue.iter().copied()
    }

    /// Players currently holding `team`.
    pub fn population(&self, team: Team) -> usize {
        self.population.get(&team).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Forgets every assignment while keeping the team set.
    pub fn reset(&mut self) {
        for count in self.population.values_mut() {
            *count = 0;
        }
    }
}
