//! Dense tables of the forward recurrence. Each state is a serialized 2-d array.
use crate::numeric::Numeric;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Mat,
    Ins,
    Del,
}

/// M/I/D tables of one pair, (read_len + 1) x (hapl_len + 1) each.
#[derive(Debug, Clone)]
pub struct MidTable<T> {
    mat_dp: Vec<T>,
    ins_dp: Vec<T>,
    del_dp: Vec<T>,
    row: usize,
    column: usize,
    // Bases of the lane, used as headers when printing.
    read: Vec<u8>,
    hapl: Vec<u8>,
}

impl<T: Clone> MidTable<T> {
    pub fn new(read: &[u8], hapl: &[u8], zero: T) -> Self {
        let (row, column) = (read.len() + 1, hapl.len() + 1);
        Self {
            mat_dp: vec![zero.clone(); row * column],
            ins_dp: vec![zero.clone(); row * column],
            del_dp: vec![zero; row * column],
            row,
            column,
            read: read.to_vec(),
            hapl: hapl.to_vec(),
        }
    }
    pub fn row(&self) -> usize {
        self.row
    }
    pub fn column(&self) -> usize {
        self.column
    }
    fn table(&self, state: State) -> &[T] {
        match state {
            State::Mat => &self.mat_dp,
            State::Ins => &self.ins_dp,
            State::Del => &self.del_dp,
        }
    }
    pub fn get(&self, i: usize, j: usize, state: State) -> &T {
        &self.table(state)[i * self.column + j]
    }
    pub fn get_mut(&mut self, i: usize, j: usize, state: State) -> &mut T {
        let idx = i * self.column + j;
        match state {
            State::Mat => &mut self.mat_dp[idx],
            State::Ins => &mut self.ins_dp[idx],
            State::Del => &mut self.del_dp[idx],
        }
    }
    /// Row `i` of the given state.
    pub fn line(&self, i: usize, state: State) -> &[T] {
        &self.table(state)[i * self.column..(i + 1) * self.column]
    }
}

impl<T: Numeric> MidTable<T> {
    /// Sum of the M row and the I row of the last read position, columns 1 and above.
    pub fn result(&self) -> T {
        let last = self.row - 1;
        let sum = |state| {
            self.line(last, state)
                .iter()
                .skip(1)
                .fold(T::zero(), |acc, x| acc + x.clone())
        };
        sum(State::Mat) + sum(State::Ins)
    }
}

impl<T: Numeric> std::fmt::Display for MidTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, " \t")?;
        for j in 0..self.column {
            let base = if j == 0 { '-' } else { self.hapl[j - 1] as char };
            write!(f, "\t{}", base)?;
        }
        writeln!(f)?;
        for i in 0..self.row {
            let base = if i == 0 { '-' } else { self.read[i - 1] as char };
            for (label, state) in [("M", State::Mat), ("I", State::Ins), ("D", State::Del)] {
                write!(f, "{}\t{}", base, label)?;
                for x in self.line(i, state) {
                    write!(f, "\t{}", x)?;
                }
                writeln!(f)?;
            }
        }
        write!(f, "result\t{}", self.result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn layout() {
        let mut table = MidTable::new(b"AC", b"GTA", 0f32);
        assert_eq!((table.row(), table.column()), (3, 4));
        *table.get_mut(2, 1, State::Mat) = 1.5;
        *table.get_mut(2, 3, State::Ins) = 0.25;
        *table.get_mut(2, 2, State::Del) = 100.0;
        assert_eq!(*table.get(2, 1, State::Mat), 1.5);
        assert_eq!(table.line(2, State::Mat), &[0.0, 1.5, 0.0, 0.0]);
        assert_eq!(table.result(), 1.75);
        let dump = table.to_string();
        assert!(dump.starts_with(" \t\t-\tG\tT\tA"));
        assert!(dump.ends_with("result\t1.75"));
        assert_eq!(dump.lines().count(), 1 + 3 * 3 + 1);
    }
    #[test]
    fn degenerate_table_sums_to_zero() {
        let table = MidTable::new(b"", b"ACGT", 0f32);
        assert_eq!(table.result(), 0.0);
        let table = MidTable::new(b"ACGT", b"", 0f32);
        assert_eq!(table.result(), 0.0);
    }
}
