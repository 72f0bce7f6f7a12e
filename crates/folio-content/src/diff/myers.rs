//! Myers O(ND) edit script in linear space
//!
//! Works on token slices. Each range is trimmed of its common prefix and
//! suffix, split at the middle snake and its halves solved in turn, so only
//! two frontier vectors are kept. A range whose edit distance exceeds the cost
//! limit is split at the furthest forward point instead; the script stays
//! valid but may no longer be minimal.

use std::ops::Range;

/// One step of an edit script, indexing into the source (`a`) and target (`b`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Edit {
    /// `a[i] == b[j]`
    Equal(usize, usize),
    /// `a[i]` removed
    Delete(usize),
    /// `b[j]` added
    Insert(usize),
}

/// Lower bound of the middle snake search depth
const MIN_COST_LIMIT: usize = 256;

/// Frontier slot of a diagonal nothing reached
const UNREACHED: isize = -1;

enum Task {
    Range { a: Range<usize>, b: Range<usize> },
    Equal { a: usize, b: usize, len: usize },
}

/// Compute an edit script turning `a` into `b`
pub(crate) fn edit_script<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Edit> {
    let mut frontiers = Frontiers::new(cost_limit(a.len() + b.len()));
    let mut edits = Vec::with_capacity(a.len().max(b.len()));
    // Popped in script order: later pieces are pushed first.
    let mut tasks = vec![Task::Range {
        a: 0..a.len(),
        b: 0..b.len(),
    }];

    while let Some(task) = tasks.pop() {
        match task {
            Task::Equal { a: i, b: j, len } => {
                edits.extend((0..len).map(|s| Edit::Equal(i + s, j + s)));
            }
            Task::Range {
                a: mut ar,
                b: mut br,
            } => {
                let prefix = common_prefix(&a[ar.clone()], &b[br.clone()]);
                edits.extend((0..prefix).map(|s| Edit::Equal(ar.start + s, br.start + s)));
                ar.start += prefix;
                br.start += prefix;

                let suffix = common_suffix(&a[ar.clone()], &b[br.clone()]);
                ar.end -= suffix;
                br.end -= suffix;
                if suffix > 0 {
                    tasks.push(Task::Equal {
                        a: ar.end,
                        b: br.end,
                        len: suffix,
                    });
                }

                if ar.is_empty() || br.is_empty() {
                    edits.extend(ar.map(Edit::Delete));
                    edits.extend(br.map(Edit::Insert));
                    continue;
                }

                let (x, y) = frontiers.split(&a[ar.clone()], &b[br.clone()]);
                tasks.push(Task::Range {
                    a: ar.start + x..ar.end,
                    b: br.start + y..br.end,
                });
                tasks.push(Task::Range {
                    a: ar.start..ar.start + x,
                    b: br.start..br.start + y,
                });
            }
        }
    }
    edits
}

fn common_prefix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Search depth for inputs of `total` tokens, roughly `sqrt(total)`
fn cost_limit(total: usize) -> usize {
    let mut limit = 1usize;
    while limit.saturating_mul(limit) < total {
        limit <<= 1;
    }
    limit.max(MIN_COST_LIMIT)
}

/// Furthest-reaching x per diagonal, forward from the start and backward
/// from the end of the current range
///
/// Only diagonals visited during the current [`Frontiers::split`] are ever
/// read, so the buffers are reused across ranges without clearing.
struct Frontiers {
    forward: Vec<isize>,
    backward: Vec<isize>,
    offset: isize,
    limit: isize,
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
impl Frontiers {
    fn new(limit: usize) -> Self {
        let len = 2 * limit + 3;
        Self {
            forward: vec![UNREACHED; len],
            backward: vec![UNREACHED; len],
            offset: limit as isize + 1,
            limit: limit as isize,
        }
    }

    fn slot(&self, k: isize) -> usize {
        (k + self.offset) as usize
    }

    /// Next furthest x on diagonal `k` at depth `d`, or `None` if the grid
    /// `n x m` cannot be reached there
    fn step(
        v: &[isize],
        slot: impl Fn(isize) -> usize,
        k: isize,
        d: isize,
        n: isize,
        m: isize,
    ) -> Option<isize> {
        let down = (k != -d)
            .then(|| v[slot(k - 1)])
            .filter(|&x| x != UNREACHED)
            .map(|x| x + 1)
            .filter(|&x| x <= n);
        let right = (k != d)
            .then(|| v[slot(k + 1)])
            .filter(|&x| x != UNREACHED)
            .filter(|&x| x - k <= m);
        match (down, right) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    /// Point on a shortest path through the `a x b` grid, strictly between
    /// its corners
    ///
    /// Both inputs are non-empty and share no prefix or suffix.
    fn split<T: PartialEq>(&mut self, a: &[T], b: &[T]) -> (usize, usize) {
        let n = a.len() as isize;
        let m = b.len() as isize;
        let delta = n - m;
        let odd = delta & 1 == 1;
        let max_d = ((n + m + 1) / 2).min(self.limit);
        let offset = self.offset;
        let slot = move |k: isize| (k + offset) as usize;

        for d in 0..=max_d {
            let mut k = -d;
            while k <= d {
                let start = if d == 0 {
                    Some(0)
                } else {
                    Self::step(&self.forward, slot, k, d, n, m)
                };
                let Some(x0) = start else {
                    self.forward[slot(k)] = UNREACHED;
                    k += 2;
                    continue;
                };
                let y0 = x0 - k;
                let (mut x, mut y) = (x0, y0);
                while x < n && y < m && a[x as usize] == b[y as usize] {
                    x += 1;
                    y += 1;
                }
                self.forward[slot(k)] = x;
                if odd && (k - delta).abs() < d {
                    let back = self.backward[slot(delta - k)];
                    if back != UNREACHED && x + back >= n {
                        return (x0 as usize, y0 as usize);
                    }
                }
                k += 2;
            }

            let mut k = -d;
            while k <= d {
                let start = if d == 0 {
                    Some(0)
                } else {
                    Self::step(&self.backward, slot, k, d, n, m)
                };
                let Some(mut x) = start else {
                    self.backward[slot(k)] = UNREACHED;
                    k += 2;
                    continue;
                };
                let mut y = x - k;
                while x < n && y < m && a[(n - x - 1) as usize] == b[(m - y - 1) as usize] {
                    x += 1;
                    y += 1;
                }
                self.backward[slot(k)] = x;
                if !odd && (k - delta).abs() <= d {
                    let fwd = self.forward[slot(delta - k)];
                    if fwd != UNREACHED && x + fwd >= n {
                        return ((n - x) as usize, (m - y) as usize);
                    }
                }
                k += 2;
            }
        }

        self.furthest_forward(n, m, max_d)
    }

    /// Fallback split once the search depth is exhausted
    fn furthest_forward(&self, n: isize, m: isize, d: isize) -> (usize, usize) {
        let mut best: Option<(isize, isize)> = None;
        let mut k = -d;
        while k <= d {
            let x = self.forward[self.slot(k)];
            let y = x - k;
            let interior = x != UNREACHED && x + y > 0 && x + y < n + m;
            if interior && !best.is_some_and(|(bx, by)| x + y <= bx + by) {
                best = Some((x, y));
            }
            k += 2;
        }
        let (x, y) = best.unwrap_or((n / 2, m / 2));
        (x as usize, y as usize)
    }
}
