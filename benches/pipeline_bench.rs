//! Performance benchmarks for the emotion pipeline

use au_emotion::{aggregate_by_second, analyze_log, detect_emotions, sanitize, PipelineConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const EXPRESSIONS: [&str; 12] = [
    "CheekRaiserL",
    "CheekRaiserR",
    "LipCornerPullerL",
    "LipCornerPullerR",
    "InnerBrowRaiserL",
    "OuterBrowRaiserR",
    "BrowLowererL",
    "UpperLidRaiserL",
    "LipCornerDepressorR",
    "NoseWrinklerL",
    "LipStretcherR",
    "JawDrop",
];

/// Generate a synthetic log: `tasks` tasks of `seconds` seconds, 10 samples per second
fn synthetic_log(tasks: u32, seconds: u32) -> String {
    let mut log = String::from("Time,Expression,Weight\n");
    let mut sample = 0u64;
    for task in 0..tasks {
        if task > 0 {
            log.push_str(&format!("### New level - TASK {} ###\n", task));
        }
        for second in 0..seconds {
            let total = task * seconds + second;
            let (minute, sec) = (total / 60 % 60, total % 60);
            for tenth in 0..10 {
                let expression = EXPRESSIONS[(sample % EXPRESSIONS.len() as u64) as usize];
                let weight = (sample % 97) as f64 / 97.0;
                if sample % 50 == 0 {
                    log.push_str(&format!("1:{:02}:{:02}.{}00 PM,Invalid,0\n", minute, sec, tenth));
                } else if sample % 7 == 0 {
                    // Comma decimal separator
                    log.push_str(&format!(
                        "1:{:02}:{:02}.{}00 PM,{},{}\n",
                        minute,
                        sec,
                        tenth,
                        expression,
                        format!("{:.3}", weight).replace('.', ",")
                    ));
                } else {
                    log.push_str(&format!("1:{:02}:{:02}.{}00 PM,{},{:.3}\n", minute, sec, tenth, expression, weight));
                }
                sample += 1;
            }
        }
    }
    log
}

fn bench_pipeline(c: &mut Criterion) {
    // 5 tasks of 2 minutes each
    let log = synthetic_log(5, 120);
    let config = PipelineConfig::default();

    c.bench_function("analyze_log_5x120s", |b| {
        b.iter(|| {
            let _ = analyze_log("bench.csv", black_box(&log), black_box(&config));
        });
    });

    c.bench_function("sanitize_5x120s", |b| {
        b.iter(|| {
            let _ = sanitize(black_box(&log));
        });
    });

    let rows: Vec<_> = match sanitize(&log) {
        Ok(sanitized) => sanitized.rows().cloned().collect(),
        Err(e) => panic!("synthetic log should sanitize: {}", e),
    };
    let aggregated = aggregate_by_second(&rows).rows;

    c.bench_function("aggregate_by_second", |b| {
        b.iter(|| {
            let _ = aggregate_by_second(black_box(&rows));
        });
    });

    c.bench_function("detect_emotions", |b| {
        b.iter(|| {
            let _ = detect_emotions(black_box(&aggregated));
        });
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
