#![allow(unused_must_use)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use logscout::{collect, flatten, search, tail, EngineConfig, SearchFilter};
use std::{fs::File, io::Write, num::NonZeroUsize};
use tempfile::tempdir;
use zip::write::FileOptions;

fn create_log_files(
    dir: &tempfile::TempDir,
    file_count: usize,
    lines_per_file: usize,
) -> std::io::Result<()> {
    for i in 0..file_count {
        let mut file = File::create(dir.path().join(format!("app_{}.log", i)))?;
        for j in 0..lines_per_file {
            writeln!(file, "2024-01-01T00:00:{:02} INFO request {} served", j % 60, j)?;
            if j % 50 == 0 {
                writeln!(file, "2024-01-01T00:00:{:02} ERROR request {} failed", j % 60, j)?;
            }
        }
    }
    Ok(())
}

fn create_log_archive(dir: &tempfile::TempDir, members: usize, lines: usize) -> std::io::Result<()> {
    let mut writer = zip::ZipWriter::new(File::create(dir.path().join("bundle.zip"))?);
    for i in 0..members {
        writer.start_file(format!("archived_{}.log", i), FileOptions::default())?;
        for j in 0..lines {
            writeln!(writer, "INFO archived line {}", j)?;
        }
        writer.write_all(b"ERROR archived failure\n")?;
    }
    writer.finish()?;
    Ok(())
}

fn config_with_threads(threads: usize) -> EngineConfig {
    EngineConfig {
        thread_count: NonZeroUsize::new(threads).unwrap(),
        ..EngineConfig::default()
    }
}

fn bench_file_scaling(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    let config = config_with_threads(4);

    let mut group = c.benchmark_group("File Scaling");
    for &count in &[1, 10, 100] {
        create_log_files(&dir, count, 200)?;
        let entries = flatten(dir.path()).unwrap();

        group.bench_function(format!("files_{}", count), |b| {
            b.iter(|| black_box(search(&entries, "ERROR", &config).unwrap()));
        });
    }
    group.finish();
    Ok(())
}

fn bench_thread_count(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    create_log_files(&dir, 50, 500)?;
    let entries = flatten(dir.path()).unwrap();

    let mut group = c.benchmark_group("Thread Count");
    for &threads in &[1, 2, 4, 8] {
        let config = config_with_threads(threads);
        group.bench_function(format!("threads_{}", threads), |b| {
            b.iter(|| black_box(search(&entries, "ERROR", &config).unwrap()));
        });
    }
    group.finish();
    Ok(())
}

fn bench_archive_search(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    create_log_archive(&dir, 20, 1000)?;
    let archive = dir.path().join("bundle.zip");
    let config = EngineConfig::default();

    let mut group = c.benchmark_group("Archive Search");
    group.bench_function("flatten", |b| {
        b.iter(|| black_box(flatten(&archive).unwrap()));
    });
    let entries = flatten(&archive).unwrap();
    group.bench_function("search_members", |b| {
        b.iter(|| black_box(search(&entries, "ERROR", &config).unwrap()));
    });
    group.bench_function("collect_recursive", |b| {
        b.iter(|| black_box(collect(dir.path(), &SearchFilter::new().recursive(true)).unwrap()));
    });
    group.finish();
    Ok(())
}

fn bench_tail(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    create_log_files(&dir, 1, 200_000)?;
    let path = dir.path().join("app_0.log");
    let config = EngineConfig::default();

    let mut group = c.benchmark_group("Tail");
    for &lines in &[10, 100, 1000] {
        group.bench_function(format!("last_{}", lines), |b| {
            b.iter(|| black_box(tail(&path, "", lines, None, &config).unwrap()));
        });
    }
    group.bench_function("last_1000_filtered", |b| {
        b.iter(|| black_box(tail(&path, "", 1000, Some("error"), &config).unwrap()));
    });
    group.finish();
    Ok(())
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_file_scaling, bench_thread_count, bench_archive_search, bench_tail
}

criterion_main!(benches);
