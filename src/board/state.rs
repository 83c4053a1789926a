//! Board state representation.
//!
//! A rectangular grid of territories stored row-major in a flat vector, so
//! lookup by location is a bounds check plus an index computation. Every
//! mutating operation validates its inputs before touching any territory.

use thiserror::Error;

use super::location::{Adjacency, Location};
use super::territory::Territory;
use super::MAX_TERRITORIES;
use crate::player::PlayerToken;

/// Errors raised by board lookups and mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("no territory at {0}")]
    NotFound(Location),

    #[error("cannot place armies at {location}: {reason}")]
    InvalidPlacement { location: Location, reason: String },

    #[error("a {height}x{width} board must have between 1 and {max} territories", max = MAX_TERRITORIES)]
    InvalidDimensions { height: u32, width: u32 },

    #[error("{0} cannot be paired with itself")]
    SameTerritory(Location),
}

/// The full grid of territories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    height: i32,
    width: i32,
    adjacency: Adjacency,
    territories: Vec<Territory>,
}

impl Board {
    /// Creates an empty board of `height` rows by `width` columns.
    ///
    /// Fails when either dimension is zero or the board would hold more than
    /// `MAX_TERRITORIES` territories.
    pub fn new(height: u32, width: u32, adjacency: Adjacency) -> Result<Self, BoardError> {
        let cells = u64::from(height) * u64::from(width);
        if cells == 0 || cells > MAX_TERRITORIES as u64 {
            return Err(BoardError::InvalidDimensions { height, width });
        }
        // Both dimensions are now at most MAX_TERRITORIES.
        let (height, width) = (height as i32, width as i32);
        let mut territories = Vec::with_capacity(cells as usize);
        for row in 0..height {
            for column in 0..width {
                territories.push(Territory::empty(Location::new(row, column)));
            }
        }
        Ok(Board {
            height,
            width,
            adjacency,
            territories,
        })
    }

    /// All territories in row-major order.
    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }

    fn index(&self, loc: Location) -> Option<usize> {
        let in_bounds =
            (0..self.height).contains(&loc.row) && (0..self.width).contains(&loc.column);
        in_bounds.then(|| (loc.row * self.width + loc.column) as usize)
    }

    /// Returns true if `loc` lies on the board.
    pub fn contains(&self, loc: Location) -> bool {
        self.index(loc).is_some()
    }

    pub fn get_territory(&self, loc: Location) -> Result<&Territory, BoardError> {
        self.index(loc)
            .map(|i| &self.territories[i])
            .ok_or(BoardError::NotFound(loc))
    }

    pub(crate) fn territory_mut(&mut self, loc: Location) -> Result<&mut Territory, BoardError> {
        match self.index(loc) {
            Some(i) => Ok(&mut self.territories[i]),
            None => Err(BoardError::NotFound(loc)),
        }
    }

    /// Mutable access to two distinct territories at once.
    pub(crate) fn territory_pair_mut(
        &mut self,
        a: Location,
        b: Location,
    ) -> Result<(&mut Territory, &mut Territory), BoardError> {
        let i = self.index(a).ok_or(BoardError::NotFound(a))?;
        let j = self.index(b).ok_or(BoardError::NotFound(b))?;
        if i == j {
            return Err(BoardError::SameTerritory(a));
        }
        if i < j {
            let (low, high) = self.territories.split_at_mut(j);
            Ok((&mut low[i], &mut high[0]))
        } else {
            let (low, high) = self.territories.split_at_mut(i);
            Ok((&mut high[0], &mut low[j]))
        }
    }

    pub fn territories_owned_by(&self, token: PlayerToken) -> impl Iterator<Item = &Territory> {
        self.territories.iter().filter(move |t| t.is_owned_by(token))
    }

    /// Territories on the board that border `loc`.
    pub fn neighbours(&self, loc: Location) -> impl Iterator<Item = &Territory> + '_ {
        self.adjacency
            .neighbours(loc)
            .filter_map(move |n| self.index(n).map(|i| &self.territories[i]))
    }

    /// Returns true if both locations are on the board and border each other.
    pub fn is_adjacent(&self, a: Location, b: Location) -> bool {
        self.contains(a) && self.contains(b) && self.adjacency.is_adjacent(a, b)
    }

    /// Adds `count` armies for `token` at `loc`, claiming the territory if unowned.
    ///
    /// Fails without changing anything when the location is off the board, owned
    /// by someone else, or `count` is zero.
    pub fn place_army(&mut self, token: PlayerToken, loc: Location, count: u32) -> Result<(), BoardError> {
        if count == 0 {
            return Err(BoardError::InvalidPlacement {
                location: loc,
                reason: "army count must be positive".to_string(),
            });
        }
        let territory = self.territory_mut(loc)?;
        match territory.owner {
            Some(owner) if owner != token => Err(BoardError::InvalidPlacement {
                location: loc,
                reason: "territory is owned by another player".to_string(),
            }),
            _ => {
                territory.owner = Some(token);
                territory.armies += count;
                Ok(())
            }
        }
    }

    /// Hands `loc` to `new_owner` with exactly `armies` stationed there.
    pub fn transfer_ownership(
        &mut self,
        loc: Location,
        new_owner: PlayerToken,
        armies: u32,
    ) -> Result<(), BoardError> {
        self.territory_mut(loc)?.transfer(new_owner, armies);
        Ok(())
    }

    /// Clears every territory owned by `token`. Returns how many were cleared.
    pub fn clear_owner(&mut self, token: PlayerToken) -> usize {
        let mut cleared = 0;
        for territory in self.territories.iter_mut().filter(|t| t.is_owned_by(token)) {
            territory.clear();
            cleared += 1;
        }
        cleared
    }

    /// Total armies on the board across all owners.
    pub fn total_armies(&self) -> u32 {
        self.territories.iter().map(|t| t.armies).sum()
    }

    /// Armies stationed on territories owned by `token`.
    pub fn armies_owned_by(&self, token: PlayerToken) -> u32 {
        self.territories_owned_by(token).map(|t| t.armies).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(3, 4, Adjacency::Orthogonal).unwrap()
    }

    #[test]
    fn new_board_is_empty() {
        let b = board();
        assert_eq!(b.territories().len(), 12);
        assert!(b.territories().iter().all(|t| t.owner.is_none() && t.armies == 0));
        assert_eq!(b.total_armies(), 0);
        assert_eq!(b.get_territory(Location::new(2, 3)).unwrap().location, Location::new(2, 3));
    }

    #[test]
    fn lookup_off_board_fails() {
        let b = board();
        assert_eq!(
            b.get_territory(Location::new(3, 0)),
            Err(BoardError::NotFound(Location::new(3, 0)))
        );
        assert!(b.get_territory(Location::new(0, -1)).is_err());
    }

    #[test]
    fn place_army_claims_and_stacks() {
        let mut b = board();
        let p = PlayerToken::generate();
        let loc = Location::new(1, 1);
        b.place_army(p, loc, 1).unwrap();
        b.place_army(p, loc, 2).unwrap();
        let t = b.get_territory(loc).unwrap();
        assert_eq!(t.owner, Some(p));
        assert_eq!(t.armies, 3);
        assert_eq!(b.armies_owned_by(p), 3);
        assert_eq!(b.territories_owned_by(p).count(), 1);
    }

    #[test]
    fn place_army_rejects_other_owner_without_mutation() {
        let mut b = board();
        let p1 = PlayerToken::generate();
        let p2 = PlayerToken::generate();
        let loc = Location::new(0, 0);
        b.place_army(p1, loc, 1).unwrap();
        let before = b.clone();
        assert!(matches!(
            b.place_army(p2, loc, 1),
            Err(BoardError::InvalidPlacement { .. })
        ));
        assert!(b.place_army(p1, loc, 0).is_err());
        assert!(b.place_army(p1, Location::new(9, 9), 1).is_err());
        assert_eq!(b, before);
    }

    #[test]
    fn clear_owner_resets_territories() {
        let mut b = board();
        let p1 = PlayerToken::generate();
        let p2 = PlayerToken::generate();
        b.place_army(p1, Location::new(0, 0), 3).unwrap();
        b.place_army(p1, Location::new(0, 1), 1).unwrap();
        b.place_army(p2, Location::new(2, 2), 2).unwrap();
        assert_eq!(b.clear_owner(p1), 2);
        assert_eq!(b.territories_owned_by(p1).count(), 0);
        assert_eq!(b.get_territory(Location::new(0, 0)).unwrap().armies, 0);
        assert_eq!(b.total_armies(), 2);
    }

    #[test]
    fn neighbours_respect_edges() {
        let b = board();
        assert_eq!(b.neighbours(Location::new(0, 0)).count(), 2);
        assert_eq!(b.neighbours(Location::new(1, 1)).count(), 4);
        assert!(b.is_adjacent(Location::new(0, 0), Location::new(0, 1)));
        assert!(!b.is_adjacent(Location::new(0, 3), Location::new(0, 4)));
    }

    #[test]
    fn transfer_sets_owner_and_armies() {
        let mut b = board();
        let p1 = PlayerToken::generate();
        let p2 = PlayerToken::generate();
        let loc = Location::new(1, 2);
        b.place_army(p1, loc, 4).unwrap();
        b.transfer_ownership(loc, p2, 2).unwrap();
        let t = b.get_territory(loc).unwrap();
        assert_eq!(t.owner, Some(p2));
        assert_eq!(t.armies, 2);
    }

    #[test]
    fn rejects_empty_or_oversized_boards() {
        for (h, w) in [(0, 5), (5, 0), (50_000, 50_000), (3_000_000_000, 2), (u32::MAX, u32::MAX)] {
            assert_eq!(
                Board::new(h, w, Adjacency::Orthogonal),
                Err(BoardError::InvalidDimensions { height: h, width: w })
            );
        }
        let widest = Board::new(1, MAX_TERRITORIES as u32, Adjacency::Orthogonal).unwrap();
        assert_eq!(widest.territories().len(), MAX_TERRITORIES);
    }

    #[test]
    fn pair_access_is_disjoint() {
        let mut b = board();
        let (x, y) = (Location::new(2, 1), Location::new(0, 3));
        {
            let (first, second) = b.territory_pair_mut(x, y).unwrap();
            first.armies = 7;
            second.armies = 1;
        }
        assert_eq!(b.get_territory(x).unwrap().armies, 7);
        assert_eq!(b.get_territory(y).unwrap().armies, 1);
        assert_eq!(b.territory_pair_mut(x, x).unwrap_err(), BoardError::SameTerritory(x));
        assert!(matches!(
            b.territory_pair_mut(x, Location::new(9, 9)),
            Err(BoardError::NotFound(_))
        ));
    }
}
