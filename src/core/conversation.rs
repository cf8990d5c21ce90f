use crate::core::message::Turn;

/// Append-only record of the turns exchanged in one session.
#[derive(Debug, Default, Clone)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The last `count` turns, oldest first.
    pub fn recent(&self, count: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(count);
        &self.turns[start..]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl<'a> IntoIterator for &'a ConversationStore {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Usage;

    fn store_with(count: usize) -> ConversationStore {
        let mut store = ConversationStore::new();
        for index in 0..count {
            if index % 2 == 0 {
                store.push(Turn::user(format!("question {index}")));
            } else {
                store.push(Turn::assistant(format!("answer {index}"), Usage::default()));
            }
        }
        store
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let store = store_with(14);
        let recent = store.recent(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].content, "question 4");
        assert_eq!(recent[9].content, "answer 13");
    }

    #[test]
    fn recent_with_short_history_returns_everything() {
        let store = store_with(3);
        assert_eq!(store.recent(10), store.turns());
        assert!(ConversationStore::new().recent(10).is_empty());
    }

    #[test]
    fn push_appends_at_the_end() {
        let mut store = store_with(2);
        store.push(Turn::user("latest"));
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.turns().last().map(|turn| turn.content.as_str()),
            Some("latest")
        );
    }
}
