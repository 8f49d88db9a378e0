use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tempfile::tempdir;
use time::{Date, Duration, Month};
use tokio::runtime::Runtime;
use uuid::Uuid;

use expense_ledger_server::database::{Db, get_user_db, init_main_db};
use expense_ledger_server::ledger::{LedgerReconciler, OverdraftPolicy};
use expense_ledger_server::models::{Amount, Category, ExpenseRecord, NewCredit, NewExpense};
use expense_ledger_server::query::{DateRange, QueryOptions, SortOrder, run_query};
use expense_ledger_server::store;
use expense_ledger_server::summary::{SummaryPeriod, summarize};
use rust_decimal::Decimal;

const BENCH_RECORD_COUNT: usize = 1000;

fn bench_start_date() -> Date {
    Date::from_calendar_date(2023, Month::January, 1).unwrap()
}

fn bench_expense(i: usize) -> NewExpense {
    NewExpense {
        amount: Amount::new(Decimal::new(1000 + (i % 100) as i64 * 25, 2)).unwrap(),
        description: format!("Benchmark expense {}", i),
        date: bench_start_date() + Duration::days((i % 365) as i64),
        category: Category::ALL[i % Category::ALL.len()],
    }
}

fn in_memory_expenses(count: usize) -> Vec<ExpenseRecord> {
    (0..count)
        .map(|i| ExpenseRecord::from_new(Uuid::new_v4().to_string(), bench_expense(i)))
        .collect()
}

async fn setup_benchmark_ledger(count: usize) -> (Db, tempfile::TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir.path().to_str().unwrap().to_string();
    let user_id = Uuid::new_v4().to_string();

    init_main_db(&data_path).await.unwrap();
    let db = get_user_db(&data_path, &user_id).await.unwrap();
    let ledger = LedgerReconciler::new(OverdraftPolicy::Allow);

    let funding = NewCredit {
        amount: Amount::new(Decimal::new(1_000_000, 0)).unwrap(),
        description: "Benchmark funding".to_string(),
        date: bench_start_date(),
    };
    store::create_credit(&db, &ledger, funding).await.unwrap();
    for i in 0..count {
        store::create_expense(&db, &ledger, bench_expense(i))
            .await
            .unwrap();
    }

    (db, temp_dir)
}

fn criterion_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let expenses = in_memory_expenses(BENCH_RECORD_COUNT);

    let filtered_sorted = QueryOptions {
        search: Some("expense 1".to_string()),
        date_range: DateRange {
            start: Some(bench_start_date() + Duration::days(30)),
            end: Some(bench_start_date() + Duration::days(300)),
        },
        date_sort: Some(SortOrder::Desc),
        amount_sort: Some(SortOrder::Asc),
        ..Default::default()
    };

    c.bench_function("query_filter_sort_page", |b| {
        b.iter(|| run_query(black_box(expenses.clone()), &filtered_sorted))
    });

    let today = bench_start_date() + Duration::days(365);
    c.bench_function("summary_yearly", |b| {
        b.iter(|| summarize(black_box(&expenses), SummaryPeriod::Yearly, today))
    });

    let (db, temp_dir) = rt.block_on(setup_benchmark_ledger(BENCH_RECORD_COUNT));
    let ledger = LedgerReconciler::new(OverdraftPolicy::Allow);

    c.bench_function("list_expenses", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(store::list_expenses(&db).await.unwrap());
        })
    });

    c.bench_function("verify_balance", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(store::verify_balance(&db).await.unwrap());
        })
    });

    c.bench_function("create_expense", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                store::create_expense(&db, &ledger, bench_expense(7))
                    .await
                    .unwrap(),
            );
        })
    });

    // Close the ledger before its directory is removed.
    drop(db);
    drop(temp_dir);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
