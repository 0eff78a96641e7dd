//! Account-code classification shared by the P&L views.
//!
//! Spanish chart of accounts: group 7 is income, group 6 is expense,
//! subgroups 76/77 and 66/67 are financial rather than operating.
//! Balances follow the ledger sign convention, so a negative balance
//! on a 7xx account is income and a positive one is a correction that
//! lands on the expense side (and symmetrically for 6xx).

/// Accumulated P&L buckets. All amounts are absolute values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PnlTotals {
    pub operating_income: f64,
    pub operating_expense: f64,
    pub financial_income: f64,
    pub financial_expense: f64,
}

impl PnlTotals {
    /// Folds one account balance into the totals.
    ///
    /// Codes outside groups 6 and 7 are ignored.
    pub fn add(&mut self, code: &str, balance: f64) {
        let prefix = code.get(..2).unwrap_or("");
        match code.get(..1) {
            Some("7") => {
                let financial = matches!(prefix, "76" | "77");
                if balance < 0.0 {
                    *self.income_bucket(financial) += -balance;
                } else {
                    *self.expense_bucket(financial) += balance;
                }
            }
            Some("6") => {
                let financial = matches!(prefix, "66" | "67");
                if balance > 0.0 {
                    *self.expense_bucket(financial) += balance;
                } else {
                    *self.income_bucket(financial) += -balance;
                }
            }
            _ => {}
        }
    }

    /// Builds totals from `(account code, balance)` pairs.
    pub fn from_balances<'a, I>(balances: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut totals = Self::default();
        for (code, balance) in balances {
            totals.add(code, balance);
        }
        totals
    }

    pub fn operating_result(&self) -> f64 {
        self.operating_income - self.operating_expense
    }

    pub fn financial_result(&self) -> f64 {
        self.financial_income - self.financial_expense
    }

    pub fn pretax_result(&self) -> f64 {
        self.operating_result() + self.financial_result()
    }

    fn income_bucket(&mut self, financial: bool) -> &mut f64 {
        if financial {
            &mut self.financial_income
        } else {
            &mut self.operating_income
        }
    }

    fn expense_bucket(&mut self, financial: bool) -> &mut f64 {
        if financial {
            &mut self.financial_expense
        } else {
            &mut self.operating_expense
        }
    }
}
