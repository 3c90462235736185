//! Listener storage and isolated delivery, per event family.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use datagram::ChatLine;

use crate::dispatch::Dispatcher;
use crate::events::{
    AnnotationEvent, ChessEventUpdate, ConnectionEvent, FriendsEvent, GameEvent, MatchOfferEvent,
    SeekEvent,
};
use crate::game_list::GameList;
use crate::registry::Family;

/// Receives one family's events. Closures taking `&E` qualify.
pub trait Listener<E>: Send + Sync {
    fn on_event(&self, event: &E);
}

impl<E, F> Listener<E> for F
where
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        self(event)
    }
}

/// Receives game events. A listener that also wants board markup returns
/// itself from `annotations`.
pub trait GameListener: Send + Sync {
    fn game_event(&self, event: &GameEvent);

    fn annotations(&self) -> Option<&dyn AnnotationListener> {
        None
    }
}

impl<F> GameListener for F
where
    F: Fn(&GameEvent) + Send + Sync,
{
    fn game_event(&self, event: &GameEvent) {
        self(event)
    }
}

pub trait AnnotationListener: Send + Sync {
    fn annotation(&self, event: &AnnotationEvent);
}

pub struct ListenerSet<L: ?Sized> {
    entries: Vec<Arc<L>>,
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<L: ?Sized> ListenerSet<L> {
    /// Returns whether this was the first listener.
    pub(crate) fn add(&mut self, listener: Arc<L>) -> bool {
        self.entries.push(listener);
        self.entries.len() == 1
    }

    /// Returns whether the last listener just left. Unknown listeners are
    /// ignored.
    pub(crate) fn remove(&mut self, listener: &Arc<L>) -> bool {
        let target = Arc::as_ptr(listener) as *const ();
        let Some(pos) = self
            .entries
            .iter()
            .position(|l| Arc::as_ptr(l) as *const () == target)
        else {
            return false;
        };
        self.entries.remove(pos);
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<L>> {
        self.entries.clone()
    }
}

/// An event type delivered to plain `Listener`s of one family.
pub trait FamilyEvent: Clone + Send + Sync + Sized + 'static {
    const FAMILY: Family;

    fn listeners(hub: &Listeners) -> &ListenerSet<dyn Listener<Self>>;
    fn listeners_mut(hub: &mut Listeners) -> &mut ListenerSet<dyn Listener<Self>>;
}

macro_rules! family_event {
    ($event:ty, $family:expr, $field:ident) => {
        impl FamilyEvent for $event {
            const FAMILY: Family = $family;

            fn listeners(hub: &Listeners) -> &ListenerSet<dyn Listener<Self>> {
                &hub.$field
            }

            fn listeners_mut(hub: &mut Listeners) -> &mut ListenerSet<dyn Listener<Self>> {
                &mut hub.$field
            }
        }
    };
}

family_event!(ConnectionEvent, Family::Connection, connection);
family_event!(ChatLine, Family::Chat, chat);
family_event!(SeekEvent, Family::Seek, seek);
family_event!(GameList, Family::GameList, game_list);
family_event!(FriendsEvent, Family::Friends, friends);
family_event!(ChessEventUpdate, Family::ChessEvent, chess_event);
family_event!(MatchOfferEvent, Family::MatchOffer, match_offer);

pub struct Listeners {
    dispatcher: Arc<dyn Dispatcher>,
    connection: ListenerSet<dyn Listener<ConnectionEvent>>,
    chat: ListenerSet<dyn Listener<ChatLine>>,
    game: ListenerSet<dyn GameListener>,
    seek: ListenerSet<dyn Listener<SeekEvent>>,
    game_list: ListenerSet<dyn Listener<GameList>>,
    friends: ListenerSet<dyn Listener<FriendsEvent>>,
    chess_event: ListenerSet<dyn Listener<ChessEventUpdate>>,
    match_offer: ListenerSet<dyn Listener<MatchOfferEvent>>,
}

impl Listeners {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            dispatcher,
            connection: ListenerSet::default(),
            chat: ListenerSet::default(),
            game: ListenerSet::default(),
            seek: ListenerSet::default(),
            game_list: ListenerSet::default(),
            friends: ListenerSet::default(),
            chess_event: ListenerSet::default(),
            match_offer: ListenerSet::default(),
        }
    }

    pub fn count(&self, family: Family) -> usize {
        match family {
            Family::Connection => self.connection.len(),
            Family::Chat => self.chat.len(),
            Family::Game => self.game.len(),
            Family::Seek => self.seek.len(),
            Family::GameList => self.game_list.len(),
            Family::Friends => self.friends.len(),
            Family::ChessEvent => self.chess_event.len(),
            Family::MatchOffer => self.match_offer.len(),
        }
    }

    pub(crate) fn add<E: FamilyEvent>(&mut self, listener: Arc<dyn Listener<E>>) -> bool {
        E::listeners_mut(self).add(listener)
    }

    pub(crate) fn remove<E: FamilyEvent>(&mut self, listener: &Arc<dyn Listener<E>>) -> bool {
        E::listeners_mut(self).remove(listener)
    }

    pub(crate) fn add_game(&mut self, listener: Arc<dyn GameListener>) -> bool {
        self.game.add(listener)
    }

    pub(crate) fn remove_game(&mut self, listener: &Arc<dyn GameListener>) -> bool {
        self.game.remove(listener)
    }

    pub(crate) fn deliver<E: FamilyEvent>(&self, event: E) {
        let targets = E::listeners(self).snapshot();
        if targets.is_empty() {
            return;
        }
        self.dispatcher.dispatch(Box::new(move || {
            for listener in &targets {
                isolate(E::FAMILY, || listener.on_event(&event));
            }
        }));
    }

    pub(crate) fn deliver_game(&self, event: GameEvent) {
        let targets = self.game.snapshot();
        if targets.is_empty() {
            return;
        }
        self.dispatcher.dispatch(Box::new(move || {
            for listener in &targets {
                isolate(Family::Game, || listener.game_event(&event));
            }
        }));
    }

    /// Markup goes only to game listeners that asked for it.
    pub(crate) fn deliver_annotation(&self, event: AnnotationEvent) {
        let targets = self.game.snapshot();
        if targets.is_empty() {
            return;
        }
        self.dispatcher.dispatch(Box::new(move || {
            for listener in &targets {
                if let Some(extended) = listener.annotations() {
                    isolate(Family::Game, || extended.annotation(&event));
                }
            }
        }));
    }
}

/// Run one listener callback; a panic is logged and does not reach the
/// remaining listeners.
fn isolate(family: Family, callback: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(callback)) {
        tracing::error!(
            family = family.name(),
            "Listener panicked: {}",
            panic_message(panic.as_ref())
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
