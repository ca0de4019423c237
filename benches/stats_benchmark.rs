// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tea_map::models::activity::ActivityFacts;
use tea_map::models::{PrivacyLevel, UserStats};
use tea_map::services::privacy::can_view;
use tea_map::time_utils::CalendarWindows;

const TEAS: [&str; 5] = ["sencha", "oolong", "pu-erh", "matcha", "darjeeling"];

fn history(count: usize) -> Vec<ActivityFacts> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    (0..count)
        .map(|n| ActivityFacts {
            created_at: start + Duration::hours(n as i64 * 3),
            tea_type: (n % 7 != 0).then(|| TEAS[n % TEAS.len()].to_string()),
            duration_minutes: (n % 4 != 0).then_some((n % 90) as i64),
        })
        .collect()
}

fn benchmark_user_stats(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2025, 6, 18, 12, 0, 0).unwrap();
    let windows = CalendarWindows::at(&now);
    let small = history(50);
    let large = history(10_000);

    let mut group = c.benchmark_group("user_stats");

    group.bench_function("50_activities", |b| {
        b.iter(|| UserStats::from_activities(black_box(&small), 3, &windows))
    });

    group.bench_function("10k_activities", |b| {
        b.iter(|| UserStats::from_activities(black_box(&large), 40, &windows))
    });

    group.finish();
}

fn benchmark_visibility(c: &mut Criterion) {
    let levels = [
        PrivacyLevel::Public,
        PrivacyLevel::Friends,
        PrivacyLevel::Private,
    ];

    c.bench_function("can_view_mixed", |b| {
        b.iter(|| {
            let mut visible = 0u32;
            for owner in 0..300i64 {
                let level = levels[owner as usize % levels.len()];
                let viewer = (owner % 5 != 0).then_some(owner % 11);
                if can_view(black_box(viewer), owner, level, owner % 2 == 0) {
                    visible += 1;
                }
            }
            visible
        })
    });
}

criterion_group!(benches, benchmark_user_stats, benchmark_visibility);
criterion_main!(benches);
