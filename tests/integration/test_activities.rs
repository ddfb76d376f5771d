//! End-to-end activity attempts.
//!
//! These tests play whole attempts through the activity engine on a manual
//! clock and check the result payload that a host would submit.

use std::sync::{Arc, Mutex};

use kwento_activity::{
    Activity, ActivityKind, ActivityResult, ActivityTiming, Answer, Category, DragDropActivity,
    DragDropItem, ManualClock, MatchingActivity, MatchingPair, Phase, Point, QuizActivity,
    QuizStep, Rect, Story,
};
use serde_json::json;

fn capture() -> (
    Arc<Mutex<Vec<ActivityResult>>>,
    impl FnMut(&ActivityResult) + Send + 'static,
) {
    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&results);
    (results, move |r: &ActivityResult| {
        sink.lock().expect("poisoned").push(r.clone());
    })
}

fn questions() -> Vec<kwento_activity::Question> {
    serde_json::from_value(json!([
        {"id": "q1", "question": "Sino ang masipag?", "options": ["Langgam", "Tipaklong"], "correctAnswer": 0},
        {"id": "q2", "question": "Ano ang inipon?", "options": ["Bato", "Pagkain"], "correctAnswer": 1,
         "explanation": "Nag-ipon ng pagkain ang langgam para sa tag-ulan."},
        {"id": "q3", "question": "Kailan?", "options": ["Tag-araw", "Tag-ulan"], "correctAnswer": 0}
    ]))
    .expect("valid questions")
}

#[test]
fn test_story_comprehension_attempt() {
    let clock = Arc::new(ManualClock::new());
    let (results, on_complete) = capture();
    let story = Story {
        title: "Ang Langgam at ang Tipaklong".to_string(),
        content: "Noong unang panahon...".to_string(),
    };
    let mut quiz = QuizActivity::new(
        questions(),
        Some(story),
        ActivityTiming::default(),
        clock.clone(),
    )
    .on_complete(on_complete);

    assert_eq!(quiz.kind(), ActivityKind::StoryComprehension);
    assert!(matches!(quiz.step(), QuizStep::Story { .. }));
    clock.advance_ms(20_000);
    quiz.begin_questions().expect("begin");

    for option in [0, 1, 1] {
        quiz.select_option(option).expect("select");
        let feedback = quiz.submit().expect("submit");
        assert_eq!(feedback.selected_index, option);
        clock.advance_ms(2_500);
        quiz.tick();
    }

    let results = results.lock().expect("poisoned");
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.score, 2);
    assert_eq!(result.percentage, 67);
    assert_eq!(
        serde_json::to_value(result).expect("serialize"),
        json!({ "score": 2, "percentage": 67, "answers": [0, 1, 1], "timeSpent": 27 })
    );
}

#[test]
fn test_drag_drop_attempt_with_mixed_input() {
    let clock = Arc::new(ManualClock::new());
    let (results, on_complete) = capture();
    let items = vec![
        DragDropItem::new("i1", "aso", "hayop"),
        DragDropItem::new("i2", "mangga", "prutas"),
        DragDropItem::new("i3", "pusa", "hayop"),
    ];
    let categories: Vec<Category> = serde_json::from_value(json!([
        {"id": "c1", "categoryId": "hayop", "name": "Hayop", "orderIndex": 0},
        {"id": "c2", "categoryId": "prutas", "name": "Prutas", "orderIndex": 1}
    ]))
    .expect("valid categories");
    let mut activity =
        DragDropActivity::with_clock(items, categories, ActivityTiming::default(), clock.clone())
            .on_complete(on_complete);

    activity
        .zones_mut()
        .register("hayop", Rect::new(0.0, 0.0, 200.0, 100.0));
    activity
        .zones_mut()
        .register("prutas", Rect::new(0.0, 100.0, 200.0, 100.0));

    activity.begin_drag("i1").expect("drag");
    assert!(activity.drop_on("hayop").expect("drop"));

    activity.touch_start("i2", Point::new(500.0, 500.0)).expect("touch");
    assert_eq!(activity.touch_move(Point::new(50.0, 150.0)), Some("prutas"));
    assert!(activity.touch_end(Point::new(50.0, 150.0)).expect("release"));

    // Misplaced on purpose.
    activity.begin_drag("i3").expect("drag");
    assert!(activity.drop_on("prutas").expect("drop"));

    clock.advance_ms(12_400);
    let result = activity.check_answers().expect("check");
    assert_eq!(result.score, 2);
    assert_eq!(result.percentage, 67);
    assert_eq!(result.time_spent_seconds, 12);
    assert_eq!(
        result.answers,
        vec![Answer::from("hayop"), Answer::from("prutas"), Answer::from("prutas")]
    );
    assert!(activity.phase().is_locked());
    assert!(results.lock().expect("poisoned").is_empty());

    clock.advance_ms(3_000);
    assert_eq!(activity.tick(), Some(result));
    assert_eq!(results.lock().expect("poisoned").len(), 1);
    assert!(matches!(activity.phase(), Phase::Completed(_)));
}

#[test]
fn test_matching_attempt_then_retry() {
    let clock = Arc::new(ManualClock::new());
    let (results, on_complete) = capture();
    let pairs = vec![
        MatchingPair::new("a", "aso", "dog"),
        MatchingPair::new("b", "pusa", "cat"),
        MatchingPair::new("c", "ibon", "bird"),
    ];
    let mut activity =
        MatchingActivity::with_clock(pairs, ActivityTiming::instant(), clock.clone())
            .on_complete(on_complete);

    for id in ["a", "b", "c"] {
        activity.select_left(id).expect("left");
        activity.select_right(id).expect("right");
    }
    let first = activity.check_answers().expect("check");
    assert_eq!(first.percentage, 100);
    assert_eq!(activity.tick(), Some(first));

    activity.reset();
    assert_eq!(activity.match_count(), 0);
    for (left, right) in [("a", "b"), ("b", "a"), ("c", "c")] {
        activity.select_left(left).expect("left");
        activity.select_right(right).expect("right");
    }
    let second = activity.check_answers().expect("check");
    assert_eq!(second.score, 1);
    assert_eq!(second.percentage, 33);
    assert_eq!(activity.tick(), Some(second));

    assert_eq!(results.lock().expect("poisoned").len(), 2);
}
