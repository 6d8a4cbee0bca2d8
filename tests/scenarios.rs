use schedule_optimizer::config::OptimizationParams;
use schedule_optimizer::models::{
    CatalogInput, ClassGroup, CourseSection, Lecturer, PreferredSlot, Room, TimeSlot,
};
use schedule_optimizer::orchestrator::RunContext;
use schedule_optimizer::service::{optimize, OptimizationRequest};

fn section(id: u32, lecturer: u32, group: u32) -> CourseSection {
    CourseSection {
        id,
        course_id: 100 + id,
        program_id: 1,
        semester: 2,
        credit_hours: 1,
        class_group_id: group,
        lecturer_id: lecturer,
    }
}

fn slots(n: u32) -> Vec<TimeSlot> {
    (0..n)
        .map(|i| TimeSlot {
            id: i + 1,
            day: 1,
            start_time: 480 + i * 40,
            end_time: 520 + i * 40,
        })
        .collect()
}

/// Lecturer who is happy with every slot on day 1.
fn lecturer(id: u32, slots: &[TimeSlot]) -> Lecturer {
    Lecturer {
        id,
        preferences: slots
            .iter()
            .map(|t| PreferredSlot {
                day: t.day,
                time_slot_id: t.id,
            })
            .collect(),
    }
}

fn params() -> OptimizationParams {
    OptimizationParams::default()
        .with_swarm_size(10)
        .with_max_iterations(20)
        .with_num_runs(1)
        .with_seed(11)
}

#[test]
fn two_sections_two_slots_one_room_is_conflict_free() {
    let time_slots = slots(2);
    let request = OptimizationRequest {
        params: params(),
        catalog: CatalogInput {
            sections: vec![section(1, 1, 1), section(2, 2, 2)],
            lecturers: vec![lecturer(1, &time_slots), lecturer(2, &time_slots)],
            rooms: vec![Room { id: 1, capacity: None }],
            time_slots,
            class_groups: vec![ClassGroup { id: 1 }, ClassGroup { id: 2 }],
        },
    };

    let result = optimize(request, RunContext::default()).unwrap();
    assert!(result.success);
    assert_eq!(result.fitness, 0.0);
    assert_eq!(result.conflicts.total, 0);
    assert_eq!(result.schedule.len(), 2);
    assert_ne!(result.schedule[0].time_slot_id, result.schedule[1].time_slot_id);
}

#[test]
fn forced_overlap_reports_one_room_and_one_lecturer_conflict() {
    let time_slots = slots(1);
    for (swarm, iterations, runs) in [(1, 1, 1), (10, 20, 2), (30, 5, 3)] {
        let request = OptimizationRequest {
            params: params()
                .with_swarm_size(swarm)
                .with_max_iterations(iterations)
                .with_num_runs(runs),
            catalog: CatalogInput {
                sections: vec![section(1, 7, 1), section(2, 7, 2)],
                lecturers: vec![lecturer(7, &time_slots)],
                rooms: vec![Room { id: 1, capacity: None }],
                time_slots: time_slots.clone(),
                class_groups: vec![ClassGroup { id: 1 }, ClassGroup { id: 2 }],
            },
        };

        let result = optimize(request, RunContext::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.conflicts.room_conflicts.len(), 1);
        assert_eq!(result.conflicts.lecturer_conflicts.len(), 1);
        assert_eq!(result.conflicts.class_group_conflicts.len(), 0);
        assert_eq!(result.conflicts.preference_conflicts.len(), 0);
        assert_eq!(result.conflicts.hard_total, 2);
        assert_eq!(result.fitness, 200.0);
        assert_eq!(result.all_best_fitness.len(), runs);
    }
}

fn crowded_request(seed: u64, runs: usize) -> OptimizationRequest {
    let time_slots = slots(4);
    OptimizationRequest {
        params: params().with_seed(seed).with_num_runs(runs),
        catalog: CatalogInput {
            sections: (1..=12).map(|id| section(id, id % 3, id % 4)).collect(),
            lecturers: vec![Lecturer {
                id: 0,
                preferences: [PreferredSlot {
                    day: 1,
                    time_slot_id: 1,
                }]
                .into_iter()
                .collect(),
            }],
            rooms: vec![Room { id: 1, capacity: None }, Room { id: 2, capacity: Some(30) }],
            time_slots,
            class_groups: vec![],
        },
    }
}

#[test]
fn identical_seed_gives_identical_result() {
    let a = optimize(crowded_request(99, 2), RunContext::default()).unwrap();
    let b = optimize(crowded_request(99, 2), RunContext::default()).unwrap();
    assert_eq!(a.fitness, b.fitness);
    assert_eq!(a.all_best_fitness, b.all_best_fitness);
    assert_eq!(a.schedule, b.schedule);
}

#[test]
fn infeasible_catalog_still_succeeds() {
    // 12 sections, 4 slots x 2 rooms: hard conflicts are unavoidable.
    let result = optimize(crowded_request(5, 3), RunContext::default()).unwrap();
    assert!(result.success);
    assert!(result.conflicts.hard_total > 0);
    assert_eq!(result.all_best_fitness.len(), 3);

    let min = result
        .all_best_fitness
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    assert_eq!(result.fitness, min);
}

#[test]
fn schedule_follows_catalog_order() {
    let result = optimize(crowded_request(1, 1), RunContext::default()).unwrap();
    let ids: Vec<u32> = result.schedule.iter().map(|e| e.section_id).collect();
    assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    for e in &result.schedule {
        assert_eq!(e.course_id, 100 + e.section_id);
        assert_eq!(e.end_time - e.start_time, 40);
    }
}
