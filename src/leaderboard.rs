//! Leaderboard and scoring functionality
//!
//! This module tracks the points each student has earned in a session and
//! produces the top-of-leaderboard view that is broadcast after every
//! answer.

use std::collections::HashMap;

use itertools::Itertools;

use crate::{
    constants::leaderboard::{POINTS_PER_CORRECT, TOP_LIMIT},
    event::LeaderboardEntry,
};

/// Manages scoring for a session
///
/// Students are keyed by nickname. Every student who has answered at least
/// once appears, even with zero points. Ties keep the order in which the
/// students first answered.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    /// Nickname to (total points, order of first answer)
    scores: HashMap<String, (u64, usize)>,
    /// All students in descending score order (cached)
    scores_descending: Vec<(String, u64)>,
    /// Points awarded per correct answer
    points_per_correct: u64,
}

impl Leaderboard {
    /// Creates an empty leaderboard that awards `points_per_correct` for
    /// each correct answer
    pub fn new(points_per_correct: u64) -> Self {
        Self {
            scores: HashMap::new(),
            scores_descending: Vec::new(),
            points_per_correct,
        }
    }

    /// Records one answer from `student`
    ///
    /// Correct answers add the configured points; incorrect ones add
    /// nothing but still put the student on the board.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use quizcast::leaderboard::Leaderboard;
    ///
    /// let mut leaderboard = Leaderboard::default();
    /// leaderboard.record_answer("Alex", true);
    /// leaderboard.record_answer("Kim", false);
    /// assert_eq!(leaderboard.score("Alex"), Some(10));
    /// assert_eq!(leaderboard.score("Kim"), Some(0));
    /// ```
    pub fn record_answer(&mut self, student: &str, correct: bool) {
        let points = if correct { self.points_per_correct } else { 0 };
        self.add_points(student, points);
    }

    /// Adds `points` to `student`'s total
    pub fn add_points(&mut self, student: &str, points: u64) {
        let next_order = self.scores.len();
        let (total, _) = self
            .scores
            .entry(student.to_owned())
            .or_insert((0, next_order));
        *total = total.saturating_add(points);

        self.scores_descending = self
            .scores
            .iter()
            .sorted_by(|(_, (a_points, a_order)), (_, (b_points, b_order))| {
                b_points.cmp(a_points).then(a_order.cmp(b_order))
            })
            .map(|(name, (points, _))| (name.clone(), *points))
            .collect_vec();
    }

    /// Returns the total points of `student`, if they have answered
    pub fn score(&self, student: &str) -> Option<u64> {
        self.scores.get(student).map(|(points, _)| *points)
    }

    /// Returns the position of `student` (0-indexed), if they have answered
    pub fn position(&self, student: &str) -> Option<usize> {
        self.scores_descending
            .iter()
            .position(|(name, _)| name == student)
    }

    /// Number of students on the board
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether nobody has answered yet
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Returns the highest scores, best first, at most ten entries
    pub fn top(&self) -> Vec<LeaderboardEntry> {
        self.scores_descending
            .iter()
            .take(TOP_LIMIT)
            .map(|(name, score)| LeaderboardEntry {
                name: name.clone(),
                score: *score,
            })
            .collect_vec()
    }
}

impl Default for Leaderboard {
    /// An empty leaderboard awarding the standard points per correct answer
    fn default() -> Self {
        Self::new(POINTS_PER_CORRECT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn names(leaderboard: &Leaderboard) -> Vec<String> {
        leaderboard.top().into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn test_empty_leaderboard() {
        let leaderboard = Leaderboard::default();
        assert!(leaderboard.is_empty());
        assert!(leaderboard.top().is_empty());
        assert_eq!(leaderboard.score("Alex"), None);
        assert_eq!(leaderboard.position("Alex"), None);
    }

    #[test]
    fn test_record_answer_scoring() {
        let mut leaderboard = Leaderboard::default();
        leaderboard.record_answer("Alex", true);
        leaderboard.record_answer("Alex", true);
        leaderboard.record_answer("Kim", false);
        leaderboard.record_answer("Sam", true);

        assert_eq!(leaderboard.score("Alex"), Some(20));
        assert_eq!(leaderboard.score("Kim"), Some(0));
        assert_eq!(leaderboard.score("Sam"), Some(10));
        assert_eq!(names(&leaderboard), vec!["Alex", "Sam", "Kim"]);
        assert_eq!(leaderboard.position("Sam"), Some(1));
    }

    #[test]
    fn test_custom_points() {
        let mut leaderboard = Leaderboard::new(3);
        leaderboard.record_answer("Alex", true);
        assert_eq!(leaderboard.score("Alex"), Some(3));
    }

    #[test]
    fn test_ties_keep_first_answer_order() {
        let mut leaderboard = Leaderboard::default();
        leaderboard.record_answer("Kim", true);
        leaderboard.record_answer("Alex", true);
        leaderboard.record_answer("Sam", true);

        assert_eq!(names(&leaderboard), vec!["Kim", "Alex", "Sam"]);
    }

    #[test]
    fn test_top_truncates_to_ten() {
        let mut leaderboard = Leaderboard::default();
        for i in 0..15 {
            leaderboard.add_points(&format!("student{i}"), i);
        }

        let top = leaderboard.top();
        assert_eq!(top.len(), TOP_LIMIT);
        assert_eq!(top[0].name, "student14");
        assert_eq!(top[9].name, "student5");
        assert_eq!(leaderboard.len(), 15);
    }

    #[test]
    fn test_student_below_cutoff_keeps_score() {
        let mut leaderboard = Leaderboard::default();
        for i in 0..11 {
            leaderboard.add_points(&format!("student{i}"), 10);
        }
        assert!(!names(&leaderboard).contains(&"student10".to_owned()));

        leaderboard.add_points("student10", 10);
        assert_eq!(leaderboard.score("student10"), Some(20));
        assert_eq!(names(&leaderboard)[0], "student10");
    }

    proptest! {
        #[test]
        fn prop_top_sorted_and_bounded(
            increments in prop::collection::vec((0usize..25, 0u64..50), 0..200)
        ) {
            let mut leaderboard = Leaderboard::default();
            for (student, points) in &increments {
                leaderboard.add_points(&format!("s{student}"), *points);
            }

            let top = leaderboard.top();
            prop_assert!(top.len() <= TOP_LIMIT);
            prop_assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
            if let Some(last) = top.last() {
                let better_than_last = (0..25)
                    .filter_map(|s| leaderboard.score(&format!("s{s}")))
                    .filter(|score| *score > last.score)
                    .count();
                prop_assert!(better_than_last < top.len());
            }
        }
    }
}
