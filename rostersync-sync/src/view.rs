//! Builds the live student view from committed rows.

use crate::error::SyncResult;
use rostersync_live::{RequestView, StudentView};
use rostersync_store::Transaction;
use rostersync_types::{CourseDemand, Student};

/// Requests in natural demand order; within a demand, by request order.
pub(crate) fn student_view(tx: &dyn Transaction, student: &Student) -> SyncResult<StudentView> {
    let enrollments = tx.student_enrollments(student.id)?;
    let mut demands = tx.student_demands(student.id)?;
    demands.sort_by(CourseDemand::natural_cmp);

    let mut requests = Vec::new();
    for demand in demands {
        let mut demand_requests = tx.demand_requests(demand.id)?;
        demand_requests.sort_by_key(|r| r.order);
        for request in demand_requests {
            let course_name = tx
                .course(request.course_id)?
                .map(|c| c.course_name())
                .unwrap_or_default();
            let class_ids = enrollments
                .iter()
                .filter(|e| e.request_id == Some(request.id))
                .map(|e| e.class_id)
                .collect();
            requests.push(RequestView {
                course_id: request.course_id,
                course_name,
                priority: demand.priority,
                alternative: demand.alternative,
                waitlist: demand.waitlist,
                class_ids,
            });
        }
    }

    Ok(StudentView {
        student_id: student.id,
        session_id: student.session_id,
        external_id: student.external_id.clone(),
        name: student.display_name(),
        requests,
    })
}
