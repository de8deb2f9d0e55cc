/// Score kept while a batch of quiz answers is processed in order.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunningGrade {
    score: i32,
    answered: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScoredAnswer {
    pub(crate) correct: bool,
    pub(crate) answered: i32,
    pub(crate) score: i32,
    pub(crate) grade: i32,
}

impl RunningGrade {
    /// Records one answer and returns the score and grade as of that answer.
    pub(crate) fn record(&mut self, correct: bool) -> ScoredAnswer {
        self.answered += 1;
        if correct {
            self.score += 1;
        }
        ScoredAnswer {
            correct,
            answered: self.answered,
            score: self.score,
            grade: self.score * 100 / self.answered,
        }
    }

    pub(crate) fn answered(&self) -> i32 {
        self.answered
    }

    pub(crate) fn score(&self) -> i32 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_reflects_answers_seen_so_far() {
        let mut running = RunningGrade::default();

        let grades: Vec<(i32, i32)> = [true, false, false, true]
            .into_iter()
            .map(|correct| {
                let scored = running.record(correct);
                (scored.score, scored.grade)
            })
            .collect();

        assert_eq!(grades, vec![(1, 100), (1, 50), (1, 33), (2, 50)]);

        assert_eq!(running.answered(), 4);
        assert_eq!(running.score(), 2);
    }

    #[test]
    fn all_wrong_is_zero() {
        let mut running = RunningGrade::default();
        running.record(false);
        assert_eq!(running.record(false).grade, 0);
    }
}
