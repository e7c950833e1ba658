//! A value cell that notifies subscribers synchronously when it changes.
//!
//! The controller writes scroll offset and overlay position through one cell
//! within the same tick as the gesture that moved them, so a renderer never
//! reads one without the other.

pub type SubscriptionId = u64;

type Subscriber<T> = Box<dyn FnMut(&T) + Send>;

pub struct Observable<T> {
    value: T,
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
    next_id: SubscriptionId,
}

impl<T: Clone + PartialEq> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value. Subscribers run only when it actually changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.notify();
        true
    }

    /// Edit the value in place, notifying on change.
    pub fn update(&mut self, edit: impl FnOnce(&mut T)) -> bool {
        let mut next = self.value.clone();
        edit(&mut next);
        self.set(next)
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&T) + Send + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&self.value);
        }
    }
}

impl<T: Default + Clone + PartialEq> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_subscribers_see_changes_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut cell = Observable::new(0.0f32);
        cell.subscribe(move |value| sink.lock().unwrap().push(*value));

        assert!(cell.set(10.0));
        assert!(!cell.set(10.0));
        cell.update(|value| *value += 5.0);

        assert_eq!(*seen.lock().unwrap(), vec![10.0, 15.0]);
        assert_eq!(*cell.get(), 15.0);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);

        let mut cell = Observable::new(1);
        let id = cell.subscribe(move |_| *sink.lock().unwrap() += 1);
        cell.set(2);
        assert!(cell.unsubscribe(id));
        cell.set(3);

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(!cell.unsubscribe(id));
    }
}
