use hashbrown::HashMap;
use std::collections::BTreeSet;

use crate::config::FitnessWeights;
use crate::models::{
    ConflictReport, Lecturer, LecturerId, PairConflict, PreferenceConflict, PreferredSlot,
    ScheduleEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    Room,
    Lecturer,
    ClassGroup,
}

impl Resource {
    #[inline]
    fn key(self, e: &ScheduleEntry) -> u32 {
        match self {
            Resource::Room => e.room_id,
            Resource::Lecturer => e.lecturer_id,
            Resource::ClassGroup => e.class_group_id,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Resource::Room => "Room",
            Resource::Lecturer => "Lecturer",
            Resource::ClassGroup => "Class group",
        }
    }
}

/// Scores timetables. Holds only immutable lookup data, so one instance can
/// be shared by every worker thread.
#[derive(Debug, Clone)]
pub struct FitnessCalculator {
    preferences: HashMap<LecturerId, BTreeSet<PreferredSlot>>,
    weights: FitnessWeights,
    /// Per-conflict hard penalty actually applied. Always larger than the
    /// worst possible preference total, so one hard conflict outweighs any
    /// number of preference violations.
    hard_weight: f64,
}

impl FitnessCalculator {
    /// `sections` is the number of entries a timetable will hold; each entry
    /// can violate at most one preference.
    pub fn new(lecturers: &[Lecturer], weights: FitnessWeights, sections: usize) -> Self {
        let hard_weight = weights
            .hard
            .max(weights.preference * (sections as f64 + 1.0));
        Self {
            preferences: lecturers
                .iter()
                .map(|l| (l.id, l.preferences.clone()))
                .collect(),
            weights,
            hard_weight,
        }
    }

    #[inline]
    pub fn weights(&self) -> FitnessWeights {
        self.weights
    }

    #[inline]
    pub fn hard_weight(&self) -> f64 {
        self.hard_weight
    }

    /// Scalar fitness without building a report. Agrees with
    /// `fitness(&evaluate(schedule))`.
    pub fn score(&self, schedule: &[ScheduleEntry]) -> f64 {
        let mut hard = 0u32;
        for resource in [Resource::Room, Resource::Lecturer, Resource::ClassGroup] {
            for_each_overlap(schedule, resource, |_, _| hard += 1);
        }
        let soft = schedule.iter().filter(|e| !self.is_preferred(e)).count() as u32;
        self.combine(hard, soft)
    }

    /// Full categorized conflict breakdown.
    pub fn evaluate(&self, schedule: &[ScheduleEntry]) -> ConflictReport {
        let mut report = ConflictReport::default();
        let mut messages = Vec::new();

        for resource in [Resource::Room, Resource::Lecturer, Resource::ClassGroup] {
            let mut found = Vec::new();
            for_each_overlap(schedule, resource, |a, b| {
                messages.push(format!(
                    "{} {} double-booked on day {}: section {} ({} - {}) and section {} ({} - {})",
                    resource.label(),
                    resource.key(a),
                    a.day,
                    a.section_id,
                    format_time(a.start_time),
                    format_time(a.end_time),
                    b.section_id,
                    format_time(b.start_time),
                    format_time(b.end_time),
                ));
                found.push(PairConflict {
                    first: a.section_id,
                    second: b.section_id,
                    day: a.day,
                    resource: resource.key(a),
                });
            });
            match resource {
                Resource::Room => report.room_conflicts = found,
                Resource::Lecturer => report.lecturer_conflicts = found,
                Resource::ClassGroup => report.class_group_conflicts = found,
            }
        }

        for e in schedule.iter().filter(|e| !self.is_preferred(e)) {
            messages.push(format!(
                "Lecturer {} does not prefer day {} slot {} (section {})",
                e.lecturer_id, e.day, e.time_slot_id, e.section_id
            ));
            report.preference_conflicts.push(PreferenceConflict {
                section_id: e.section_id,
                lecturer_id: e.lecturer_id,
                day: e.day,
                time_slot_id: e.time_slot_id,
            });
        }

        report.hard_total = (report.room_conflicts.len()
            + report.lecturer_conflicts.len()
            + report.class_group_conflicts.len()) as u32;
        report.total = report.hard_total + report.preference_conflicts.len() as u32;
        report.messages = messages;
        report
    }

    pub fn fitness(&self, report: &ConflictReport) -> f64 {
        self.combine(report.hard_total, report.preference_conflicts.len() as u32)
    }

    #[inline]
    fn combine(&self, hard: u32, soft: u32) -> f64 {
        hard as f64 * self.hard_weight + soft as f64 * self.weights.preference
    }

    /// Lecturers missing from the input accept every slot. A lecturer listed
    /// with an empty set accepts none.
    #[inline]
    fn is_preferred(&self, e: &ScheduleEntry) -> bool {
        match self.preferences.get(&e.lecturer_id) {
            Some(set) => set.contains(&PreferredSlot {
                day: e.day,
                time_slot_id: e.time_slot_id,
            }),
            None => true,
        }
    }
}

/// Calls `f` once for every overlapping pair of entries that share the
/// resource. Pairs are reported in schedule order.
fn for_each_overlap<'a, F>(schedule: &'a [ScheduleEntry], resource: Resource, mut f: F)
where
    F: FnMut(&'a ScheduleEntry, &'a ScheduleEntry),
{
    let mut buckets: HashMap<u32, Vec<usize>> = HashMap::new();
    for (i, e) in schedule.iter().enumerate() {
        buckets.entry(resource.key(e)).or_default().push(i);
    }

    let mut keys: Vec<u32> = buckets.keys().copied().collect();
    keys.sort_unstable();

    for key in keys {
        let idx = &buckets[&key];
        for (n, &i) in idx.iter().enumerate() {
            for &j in &idx[n + 1..] {
                let (a, b) = (&schedule[i], &schedule[j]);
                if a.overlaps(b) {
                    f(a, b);
                }
            }
        }
    }
}

fn format_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(section: u32, room: u32, lecturer: u32, group: u32, day: u32, start: u32) -> ScheduleEntry {
        ScheduleEntry {
            section_id: section,
            course_id: section,
            class_group_id: group,
            day,
            lecturer_id: lecturer,
            time_slot_id: start / 40,
            room_id: room,
            program_id: 1,
            semester: 1,
            credit_hours: 1,
            start_time: start,
            end_time: start + 40,
        }
    }

    fn calculator() -> FitnessCalculator {
        let lecturers = vec![Lecturer {
            id: 1,
            preferences: [PreferredSlot {
                day: 1,
                time_slot_id: 12,
            }]
            .into_iter()
            .collect(),
        }];
        FitnessCalculator::new(&lecturers, FitnessWeights::default(), 12)
    }

    #[test]
    fn test_conflict_free_schedule_scores_zero() {
        let calc = calculator();
        let schedule = vec![entry(1, 1, 2, 1, 1, 480), entry(2, 1, 2, 1, 1, 520)];
        let report = calc.evaluate(&schedule);
        assert_eq!(report.total, 0);
        assert_eq!(calc.fitness(&report), 0.0);
        assert_eq!(calc.score(&schedule), 0.0);
        assert!(report.messages.is_empty());
    }

    #[test]
    fn test_each_category_detected() {
        let calc = calculator();
        let schedule = vec![
            entry(1, 1, 2, 1, 1, 480),
            // Same room, same time.
            entry(2, 1, 3, 2, 1, 500),
            // Same lecturer as 1, different room.
            entry(3, 2, 2, 3, 1, 480),
            // Same group as 1, other day: no overlap.
            entry(4, 3, 4, 1, 2, 480),
        ];
        let report = calc.evaluate(&schedule);
        assert_eq!(report.room_conflicts.len(), 1);
        assert_eq!(report.lecturer_conflicts.len(), 1);
        assert_eq!(report.class_group_conflicts.len(), 0);
        assert_eq!(report.room_conflicts[0].first, 1);
        assert_eq!(report.room_conflicts[0].second, 2);
        assert_eq!(report.hard_total, 2);
        assert_eq!(calc.fitness(&report), 200.0);
    }

    #[test]
    fn test_preference_violation_is_soft() {
        let calc = calculator();
        // Lecturer 1 prefers day 1 slot 12 (480 / 40).
        let ok = vec![entry(1, 1, 1, 1, 1, 480)];
        let bad = vec![entry(1, 1, 1, 1, 2, 480)];
        assert_eq!(calc.score(&ok), 0.0);

        let report = calc.evaluate(&bad);
        assert_eq!(report.hard_total, 0);
        assert_eq!(report.preference_conflicts.len(), 1);
        assert_eq!(report.total, 1);
        assert_eq!(calc.fitness(&report), 1.0);
        assert!(report.messages[0].contains("Lecturer 1"));
    }

    #[test]
    fn test_one_hard_conflict_outweighs_preferences() {
        let calc = calculator();
        let w = calc.weights();
        assert!(w.hard > w.preference);
        assert_eq!(calc.hard_weight(), w.hard);
    }

    #[test]
    fn test_hard_conflict_dominates_on_large_catalog() {
        let lecturers = vec![Lecturer {
            id: 1,
            preferences: [PreferredSlot {
                day: 1,
                time_slot_id: 12,
            }]
            .into_iter()
            .collect(),
        }];
        let calc = FitnessCalculator::new(&lecturers, FitnessWeights::default(), 150);

        // 101 preference violations, one per day, nothing double-booked.
        let soft_only: Vec<_> = (0..101).map(|i| entry(i, 1, 1, 1, i + 2, 480)).collect();
        // One room double-booked, lecturers 2 and 3 are unconstrained.
        let one_hard = vec![entry(1, 1, 2, 1, 1, 480), entry(2, 1, 3, 2, 1, 480)];

        let a = calc.evaluate(&soft_only);
        let b = calc.evaluate(&one_hard);
        assert_eq!((a.hard_total, a.preference_conflicts.len()), (0, 101));
        assert_eq!((b.hard_total, b.preference_conflicts.len()), (1, 0));
        assert!(
            calc.fitness(&b) > calc.fitness(&a),
            "hard conflict scored {} against {} for preferences",
            calc.fitness(&b),
            calc.fitness(&a)
        );
        assert!(calc.score(&one_hard) > calc.score(&soft_only));
    }

    #[test]
    fn test_empty_preference_set_rejects_every_slot() {
        let lecturers = vec![Lecturer {
            id: 1,
            preferences: Default::default(),
        }];
        let calc = FitnessCalculator::new(&lecturers, FitnessWeights::default(), 2);

        let report = calc.evaluate(&[entry(1, 1, 1, 1, 1, 0)]);
        assert_eq!(report.preference_conflicts.len(), 1);
        assert_eq!(calc.fitness(&report), 1.0);

        // Lecturer 9 is not listed at all.
        let report = calc.evaluate(&[entry(2, 1, 9, 1, 1, 0)]);
        assert!(report.preference_conflicts.is_empty());
    }

    #[test]
    fn test_message_formats_times() {
        let calc = calculator();
        let schedule = vec![entry(1, 5, 2, 1, 1, 480), entry(2, 5, 3, 2, 1, 480)];
        let report = calc.evaluate(&schedule);
        assert_eq!(
            report.messages[0],
            "Room 5 double-booked on day 1: section 1 (08:00 - 08:40) and section 2 (08:00 - 08:40)"
        );
    }

    fn arb_entry() -> impl Strategy<Value = ScheduleEntry> {
        (1u32..20, 1u32..3, 1u32..3, 1u32..3, 1u32..3, 0u32..4).prop_map(
            |(section, room, lecturer, group, day, slot)| {
                entry(section, room, lecturer, group, day, 480 + slot * 20)
            },
        )
    }

    proptest! {
        #[test]
        fn prop_score_matches_report(schedule in proptest::collection::vec(arb_entry(), 0..12)) {
            let calc = calculator();
            let report = calc.evaluate(&schedule);
            prop_assert_eq!(calc.score(&schedule), calc.fitness(&report));
        }

        #[test]
        fn prop_categories_sum_to_total(schedule in proptest::collection::vec(arb_entry(), 0..12)) {
            let report = calculator().evaluate(&schedule);
            let sum = report.room_conflicts.len()
                + report.lecturer_conflicts.len()
                + report.class_group_conflicts.len()
                + report.preference_conflicts.len();
            prop_assert_eq!(sum as u32, report.total);
            prop_assert_eq!(report.messages.len() as u32, report.total);
        }

        #[test]
        fn prop_fitness_non_negative_and_zero_iff_clean(schedule in proptest::collection::vec(arb_entry(), 0..12)) {
            let calc = calculator();
            let report = calc.evaluate(&schedule);
            let fitness = calc.fitness(&report);
            prop_assert!(fitness >= 0.0);
            prop_assert_eq!(fitness == 0.0, report.total == 0);
        }

        #[test]
        fn prop_hard_free_iff_fitness_below_hard_weight(schedule in proptest::collection::vec(arb_entry(), 0..12)) {
            let calc = calculator();
            let report = calc.evaluate(&schedule);
            prop_assert_eq!(calc.fitness(&report) < calc.hard_weight(), report.hard_total == 0);
        }

        #[test]
        fn prop_hard_free_iff_zero_without_preferences(schedule in proptest::collection::vec(arb_entry(), 0..12)) {
            let calc = FitnessCalculator::new(&[], FitnessWeights::default(), 12);
            let report = calc.evaluate(&schedule);
            prop_assert_eq!(calc.fitness(&report) == 0.0, report.hard_total == 0);
        }
    }
}
