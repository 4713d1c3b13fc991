//! The cooperative job queue.
//!
//! Branch bodies of an `if` are specialized as queued jobs so forward
//! references between branches — above all, calls into functions whose
//! return types are still being inferred — can be resolved by letting the
//! other branches run first. Scheduling is strictly single-threaded and
//! cooperative: a job that would need a not-yet-known return type drains the
//! queue of other jobs and polls again, which is the one suspension point in
//! the whole specializer.
//!
//! `process` is reentrant. A nested drain may consume jobs enqueued by an
//! outer caller; every job writes its own result slot, so the outer drain
//! simply finds the queue empty and its slots already filled.

use std::cell::RefCell;
use std::collections::VecDeque;

struct Job {
    run: Box<dyn FnOnce()>,
}

#[derive(Default)]
pub struct Scheduler {
    queue: RefCell<VecDeque<Job>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, run: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back(Job { run });
    }

    /// Runs queued jobs in FIFO order until the queue is empty, including
    /// jobs enqueued while draining. Returns how many jobs ran here.
    pub fn process(&self) -> usize {
        let mut processed = 0;
        loop {
            // the borrow must end before the job runs; jobs re-enter the
            // scheduler
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(job) => {
                    (job.run)();
                    processed += 1;
                }
                None => break,
            }
        }
        processed
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn fifo_order_is_preserved() {
        let scheduler = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            scheduler.enqueue(Box::new(move || order.borrow_mut().push(i)));
        }
        assert_eq!(scheduler.process(), 3);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn nested_enqueues_drain_in_the_same_pass() {
        let scheduler = Rc::new(Scheduler::new());
        let order = Rc::new(RefCell::new(Vec::new()));
        {
            let scheduler2 = scheduler.clone();
            let order1 = order.clone();
            scheduler.enqueue(Box::new(move || {
                order1.borrow_mut().push("outer");
                let order2 = order1.clone();
                scheduler2.enqueue(Box::new(move || order2.borrow_mut().push("inner")));
            }));
        }
        scheduler.process();
        assert_eq!(*order.borrow(), vec!["outer", "inner"]);
        assert_eq!(scheduler.pending(), 0);
    }
}
