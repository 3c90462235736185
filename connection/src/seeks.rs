//! Open seek postings.

use std::collections::HashMap;
use std::sync::Arc;

use chess::{Side, Variant};
use datagram::SeekInfo;

use crate::error::{ConnectionError, ConnectionResult};
use crate::game::TimeControl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seek {
    pub id: u32,
    pub name: String,
    pub titles: String,
    pub rating: Option<u32>,
    pub provisional: bool,
    pub registered: bool,
    pub computer: bool,
    /// `None` when the ruleset is not one we can play.
    pub variant: Option<Variant>,
    pub wild: u32,
    pub rating_category: String,
    pub time: TimeControl,
    pub rated: bool,
    /// The color the seeker wants, if they asked for one.
    pub color: Option<Side>,
    pub min_rating: u32,
    pub max_rating: u32,
    /// Whether the seeker confirms each opponent by hand.
    pub manual: bool,
    pub formula: bool,
}

impl From<SeekInfo> for Seek {
    fn from(info: SeekInfo) -> Self {
        Self {
            id: info.index,
            rating: (info.rating > 0).then_some(info.rating),
            variant: Variant::from_wild(info.wild),
            time: TimeControl::from_minutes(info.minutes, info.increment),
            color: match info.color {
                1 => Some(Side::White),
                0 => Some(Side::Black),
                _ => None,
            },
            name: info.name,
            titles: info.titles,
            provisional: info.provisional,
            registered: info.registered,
            computer: info.computer,
            wild: info.wild,
            rating_category: info.rating_category,
            rated: info.rated,
            min_rating: info.min_rating,
            max_rating: info.max_rating,
            manual: info.manual,
            formula: info.formula,
        }
    }
}

#[derive(Debug, Default)]
pub struct SeekTable {
    seeks: HashMap<u32, Arc<Seek>>,
}

impl SeekTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a seek, returning the one it replaces under the same id.
    pub fn add(&mut self, seek: Arc<Seek>) -> Option<Arc<Seek>> {
        self.seeks.insert(seek.id, seek)
    }

    pub fn remove(&mut self, id: u32) -> ConnectionResult<Arc<Seek>> {
        self.seeks.remove(&id).ok_or(ConnectionError::NoSuchSeek(id))
    }

    pub fn get(&self, id: u32) -> Option<&Arc<Seek>> {
        self.seeks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.seeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeks.is_empty()
    }

    pub fn clear(&mut self) {
        self.seeks.clear();
    }
}
