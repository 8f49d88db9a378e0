/*!
 * Ledger Reconciler Unit Tests
 *
 * Covers the balance arithmetic for every record mutation, the overdraft
 * policy, and the write-sets produced by `LedgerReconciler::plan`.
 */

mod common;

use common::*;
use expense_ledger_server::error::LedgerError;
use expense_ledger_server::ledger::{
    BalanceWrite, LedgerReconciler, Mutation, OverdraftPolicy, RecordWrite, expected_balance,
};
use expense_ledger_server::models::Category;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TEST_AMOUNTS: [&str; 6] = ["0.01", "1", "12.50", "30", "99.99", "1000000"];

fn rejecting() -> LedgerReconciler {
    LedgerReconciler::new(OverdraftPolicy::Reject)
}

fn allowing() -> LedgerReconciler {
    LedgerReconciler::new(OverdraftPolicy::Allow)
}

#[test]
fn new_credit_adds_amount() {
    let ledger = rejecting();
    for balance in [dec!(0), dec!(-25.50), dec!(100.00)] {
        for value in TEST_AMOUNTS {
            let credit = amount(value);
            assert_eq!(
                ledger.apply_new_credit(balance, credit).unwrap(),
                balance + credit.value()
            );
        }
    }
}

#[test]
fn new_expense_within_balance_subtracts_amount() {
    let ledger = rejecting();
    let balance = dec!(1000000);
    for value in TEST_AMOUNTS {
        let expense = amount(value);
        let updated = ledger
            .apply_new_expense(balance, expense)
            .expect("expense within balance should succeed");
        assert_eq!(updated, balance - expense.value());
    }
}

#[test]
fn new_expense_equal_to_balance_empties_account() {
    let updated = rejecting()
        .apply_new_expense(dec!(30.00), amount("30"))
        .unwrap();
    assert_eq!(updated, Decimal::ZERO);
}

#[test]
fn new_expense_over_balance_is_rejected() {
    let result = rejecting().apply_new_expense(dec!(100), amount("100.01"));

    match result {
        Err(LedgerError::InsufficientFunds { balance, amount }) => {
            assert_eq!(balance, dec!(100));
            assert_eq!(amount, dec!(100.01));
        }
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }
}

#[test]
fn allow_policy_lets_balance_go_negative() {
    let updated = allowing()
        .apply_new_expense(dec!(0), amount("250"))
        .expect("overdraft should be allowed");
    assert_eq!(updated, dec!(-250));
}

#[test]
fn expense_edit_then_revert_restores_balance() {
    let ledger = rejecting();
    let balance = dec!(70.00);
    for old in TEST_AMOUNTS {
        for new in TEST_AMOUNTS {
            let edited = ledger
                .apply_expense_edit(balance, amount(old), amount(new))
                .unwrap();
            let reverted = ledger
                .apply_expense_edit(edited, amount(new), amount(old))
                .unwrap();
            assert_eq!(reverted, balance, "edit {} -> {} did not revert", old, new);
        }
    }
}

#[test]
fn expense_edit_moves_balance_by_delta() {
    let ledger = rejecting();
    // Larger expense lowers the balance.
    assert_eq!(
        ledger.apply_expense_edit(dec!(70), amount("30"), amount("50")),
        Ok(dec!(50))
    );
    // Smaller expense raises it.
    assert_eq!(
        ledger.apply_expense_edit(dec!(50), amount("50"), amount("20")),
        Ok(dec!(80))
    );
}

#[test]
fn expense_delete_is_inverse_of_create() {
    let ledger = rejecting();
    let balance = dec!(1000000);
    for value in TEST_AMOUNTS {
        let created = ledger.apply_new_expense(balance, amount(value)).unwrap();
        assert_eq!(
            ledger.apply_expense_delete(created, amount(value)).unwrap(),
            balance
        );
    }
}

#[test]
fn credit_edit_and_delete() {
    let ledger = rejecting();
    assert_eq!(
        ledger.apply_credit_edit(dec!(200), amount("200"), amount("150")),
        Ok(dec!(150))
    );
    assert_eq!(
        ledger.apply_credit_edit(dec!(150), amount("150"), amount("175.25")),
        Ok(dec!(175.25))
    );
    assert_eq!(
        ledger.apply_credit_delete(dec!(175.25), amount("175.25")),
        Ok(dec!(0))
    );
}

#[test]
fn decimal_arithmetic_is_exact() {
    let ledger = rejecting();
    let mut balance = Decimal::ZERO;
    for _ in 0..10 {
        balance = ledger.apply_new_credit(balance, amount("0.1")).unwrap();
    }
    assert_eq!(balance, dec!(1.0));
}

#[test]
fn plan_create_expense_produces_insert_and_balance_write() {
    let expense = expense_record("e1", "30", "lunch", "2024-03-01", Category::Food);

    let write_set = rejecting()
        .plan(dec!(100.00), Mutation::CreateExpense(expense.clone()))
        .unwrap();

    assert_eq!(write_set.record, RecordWrite::InsertExpense(expense));
    assert_eq!(
        write_set.balance,
        BalanceWrite {
            previous: dec!(100.00),
            updated: dec!(70.00),
        }
    );
    assert_eq!(write_set.balance.delta(), dec!(-30));
}

#[test]
fn plan_rejected_expense_produces_no_writes() {
    let expense = expense_record("e1", "250", "laptop", "2024-03-01", Category::Education);

    let result = rejecting().plan(dec!(200), Mutation::CreateExpense(expense));

    assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
}

#[test]
fn plan_edit_expense_uses_previous_amount() {
    let previous = expense_record("e1", "30", "lunch", "2024-03-01", Category::Food);
    let updated = expense_record("e1", "50", "dinner", "2024-03-02", Category::Food);

    let write_set = rejecting()
        .plan(
            dec!(70.00),
            Mutation::EditExpense {
                previous,
                updated: updated.clone(),
            },
        )
        .unwrap();

    assert_eq!(write_set.record, RecordWrite::UpdateExpense(updated));
    assert_eq!(write_set.balance.updated, dec!(50.00));
}

#[test]
fn expense_edit_is_not_subject_to_overdraft_check() {
    let previous = expense_record("e1", "10", "bus", "2024-03-01", Category::Transport);
    let updated = expense_record("e1", "500", "bus", "2024-03-01", Category::Transport);

    let write_set = rejecting()
        .plan(dec!(0), Mutation::EditExpense { previous, updated })
        .unwrap();

    assert_eq!(write_set.balance.updated, dec!(-490));
}

#[test]
fn plan_edit_with_mismatched_ids_is_rejected() {
    let previous = credit_record("c1", "100", "salary", "2024-03-01");
    let updated = credit_record("c2", "120", "salary", "2024-03-01");

    let result = rejecting().plan(dec!(100), Mutation::EditCredit { previous, updated });

    assert!(matches!(result, Err(LedgerError::NotFound("credit"))));
}

#[test]
fn plan_deletes_by_id() {
    let ledger = rejecting();
    let expense = expense_record("e9", "12", "movie", "2024-03-05", Category::Entertainment);
    let credit = credit_record("c9", "40", "refund", "2024-03-05");

    let expense_delete = ledger
        .plan(dec!(10), Mutation::DeleteExpense(expense))
        .unwrap();
    assert_eq!(expense_delete.record, RecordWrite::DeleteExpense("e9".into()));
    assert_eq!(expense_delete.balance.updated, dec!(22));

    let credit_delete = ledger.plan(dec!(22), Mutation::DeleteCredit(credit)).unwrap();
    assert_eq!(credit_delete.record, RecordWrite::DeleteCredit("c9".into()));
    assert_eq!(credit_delete.balance.updated, dec!(-18));
}

#[test]
fn expected_balance_is_credits_minus_expenses() {
    let credits = vec![
        credit_record("c1", "200", "salary", "2024-03-01"),
        credit_record("c2", "15.50", "refund", "2024-03-02"),
    ];
    let expenses = vec![
        expense_record("e1", "30", "lunch", "2024-03-01", Category::Food),
        expense_record("e2", "4.25", "bus", "2024-03-02", Category::Transport),
    ];

    assert_eq!(expected_balance(&credits, &expenses), dec!(181.25));
    assert_eq!(expected_balance(&[], &[]), Decimal::ZERO);
}

#[test]
fn balance_overflow_is_an_error() {
    let ledger = allowing();
    let largest = amount("1000000000000");

    assert!(matches!(
        ledger.apply_new_credit(Decimal::MAX, largest),
        Err(LedgerError::BalanceOutOfRange)
    ));
    assert!(matches!(
        ledger.apply_new_expense(Decimal::MIN, largest),
        Err(LedgerError::BalanceOutOfRange)
    ));
    assert!(matches!(
        ledger.apply_expense_delete(Decimal::MAX, largest),
        Err(LedgerError::BalanceOutOfRange)
    ));
    assert!(matches!(
        ledger.apply_credit_delete(Decimal::MIN, largest),
        Err(LedgerError::BalanceOutOfRange)
    ));
}

#[test]
fn plan_fails_on_overflow_without_writes() {
    let credit = credit_record("c1", "1000000000000", "windfall", "2024-03-01");

    let result = rejecting().plan(Decimal::MAX, Mutation::CreateCredit(credit));

    assert!(matches!(result, Err(LedgerError::BalanceOutOfRange)));
}

#[test]
fn overdraft_policy_parsing() {
    assert_eq!("reject".parse::<OverdraftPolicy>(), Ok(OverdraftPolicy::Reject));
    assert_eq!(" Allow ".parse::<OverdraftPolicy>(), Ok(OverdraftPolicy::Allow));
    assert!("sometimes".parse::<OverdraftPolicy>().is_err());
    assert_eq!(OverdraftPolicy::default(), OverdraftPolicy::Reject);
    assert_eq!(allowing().overdraft_policy(), OverdraftPolicy::Allow);
    assert_eq!(
        LedgerReconciler::default().overdraft_policy(),
        OverdraftPolicy::Reject
    );
}
