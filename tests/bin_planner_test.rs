// ==========================================
// 货架段规划集成测试
// ==========================================
// 覆盖: 典型场景 + 每次运行后的空间不变量
// ==========================================


use std::collections::HashMap;

use store_space_planner::config::{config_keys, PlannerConfig};
use store_space_planner::domain::types::DistributionType;
use store_space_planner::domain::{LevelNum, PlanRequest};
use store_space_planner::engine::{ArticleResolver, PlanningMode};
use store_space_planner::logging;
use test_helpers::*;

/// 校验: 层内宽度、进深、OPUL 不落地、层高覆盖最高商品
fn assert_space_invariants(env: &TestEnv, seeded: &SeededAisle, mode: PlanningMode) {
    let resolver = ArticleResolver::new(PlannerConfig::default(), mode);
    let sections = env
        .state
        .layout_api
        .list_sections(seeded.aisle_id)
        .unwrap();
    let by_id: HashMap<i64, _> = sections.iter().map(|s| (s.id, s)).collect();

    for level in aisle_levels(env, seeded.aisle_id).unwrap() {
        let section = by_id[&level.section_id];
        let placements = level_placements(env, level.id).unwrap();

        let used: f64 = placements.iter().map(|p| p.width_used).sum();
        assert!(
            used <= section.section_width + 1e-6,
            "层 {} 宽度超限: {} > {}",
            level.level_num,
            used,
            section.section_width
        );

        let level_total: f64 = aisle_levels(env, seeded.aisle_id)
            .unwrap()
            .iter()
            .filter(|l| l.section_id == section.id)
            .map(|l| l.level_height)
            .sum();
        assert!(level_total <= section.section_height + 1e-6);

        for p in placements {
            let article = load_article(env, p.article_id).unwrap();
            let resolved = resolver.resolve(&article).unwrap();
            assert!(resolved.length <= section.section_depth + 1e-6);
            if level.level_num.is_ground() {
                assert!(!p.badge.as_deref().unwrap_or("").contains('O'));
            }
            assert!(!(article.planned && article.part_planned));
        }
    }
}

#[test]
fn test_scenario_pallet_too_tall_for_section_stays_unplanned() {
    logging::init_test();
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let id = insert_article(&env, &pallet_article(seeded.store_id, 1001, (1000.0, 500.0, 1800.0))).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("non_opul"));

    assert!(result.success, "{}", result.message);
    assert_eq!(result.planned_count, 0);
    assert_eq!(result.unplanned_count, 1);
    assert!(aisle_levels(&env, seeded.aisle_id).unwrap().is_empty());

    let article = load_article(&env, id).unwrap();
    assert!(!article.planned);
    assert!(article.section_id.is_none());
}

#[test]
fn test_scenario_pallet_fits_on_ground_level() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let id = insert_article(&env, &pallet_article(seeded.store_id, 1001, (1000.0, 500.0, 1500.0))).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("standard"));

    assert!(result.success, "{}", result.message);
    assert_eq!(result.planned_count, 1);
    assert_eq!(result.unplanned_count, 0);
    assert_eq!(result.mode.as_deref(), Some("non_opul"));
    assert!(result.run_id.is_some());

    let levels = aisle_levels(&env, seeded.aisle_id).unwrap();
    assert_eq!(levels.len(), 1);
    assert_eq!(levels[0].level_num, LevelNum::GROUND);
    assert_eq!(levels[0].level_height, 1754.0);

    let article = load_article(&env, id).unwrap();
    assert!(article.planned);
    assert!(!article.part_planned);
    assert_eq!(article.level_id, Some(levels[0].id));
    assert_eq!(article.section_id, Some(seeded.section_ids[0]));
    assert_eq!(article.effective_dt, Some(DistributionType::Pallet));
    assert_eq!(article.planned_quantity_remainder, Some(0));
    assert_space_invariants(&env, &seeded, PlanningMode::NonOpul);
}

#[test]
fn test_scenario_wide_case_picks_split_across_levels() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let first = insert_article(&env, &case_pick_article(seeded.store_id, 2001, (1600.0, 400.0, 300.0))).unwrap();
    let second = insert_article(&env, &case_pick_article(seeded.store_id, 2002, (1600.0, 400.0, 300.0))).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("non_opul"));

    assert!(result.success, "{}", result.message);
    assert_eq!(result.planned_count, 2);

    let levels = aisle_levels(&env, seeded.aisle_id).unwrap();
    let nums: Vec<LevelNum> = levels.iter().map(|l| l.level_num).collect();
    assert_eq!(nums, vec![LevelNum(1), LevelNum(2)]);
    // 300 + 127
    assert!(levels.iter().all(|l| l.level_height == 427.0));

    assert_eq!(load_article(&env, first).unwrap().level_id, Some(levels[0].id));
    assert_eq!(load_article(&env, second).unwrap().level_id, Some(levels[1].id));
    assert_space_invariants(&env, &seeded, PlanningMode::NonOpul);
}

#[test]
fn test_scenario_wide_case_pick_moves_to_next_section() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 2).unwrap();
    // 单层高度 1500 + 127，每个货架格只够一层
    insert_article(&env, &case_pick_article(seeded.store_id, 2001, (1600.0, 400.0, 1500.0))).unwrap();
    let second = insert_article(&env, &case_pick_article(seeded.store_id, 2002, (1600.0, 400.0, 1500.0))).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("non_opul"));

    assert_eq!(result.planned_count, 2);
    let article = load_article(&env, second).unwrap();
    assert_eq!(article.section_id, Some(seeded.section_ids[1]));
    assert_space_invariants(&env, &seeded, PlanningMode::NonOpul);
}

#[test]
fn test_scenario_opul_article_never_on_ground_level() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let mut opul = case_pick_article(seeded.store_id, 3001, (400.0, 300.0, 200.0));
    opul.sales_method = Some("opul".to_string());
    // 重量单独即满足落地规则
    opul.weight_g = Some(20_000.0);
    opul.ul_width = Some(800.0);
    opul.ul_length = Some(600.0);
    opul.ul_height = Some(900.0);
    let id = insert_article(&env, &opul).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("opul_mode"));

    assert!(result.success, "{}", result.message);
    assert_eq!(result.planned_count, 1);

    let article = load_article(&env, id).unwrap();
    assert_eq!(article.plan_badge.as_deref(), Some("O"));
    let level = env
        .state
        .repos
        .level_repo
        .find_by_id(article.level_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(level.level_num, LevelNum(1));
    // 整托高度 900 + 带徽章余量 254
    assert_eq!(level.level_height, 1154.0);

    let badges = env.state.plan_api.article_badges(id).unwrap();
    assert_eq!(badges.csv, "O");
    assert_eq!(badges.badges[0].label, "Opul");
    assert_space_invariants(&env, &seeded, PlanningMode::Opul);
}

#[test]
fn test_non_opul_mode_leaves_opul_articles_alone() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let mut opul = case_pick_article(seeded.store_id, 3001, (400.0, 300.0, 200.0));
    opul.sales_method = Some("OPUL".to_string());
    let id = insert_article(&env, &opul).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("non_opul"));

    assert!(result.success);
    assert_eq!(result.planned_count, 0);
    assert!(!load_article(&env, id).unwrap().planned);
}

#[test]
fn test_scenario_badge_gate_boundary_assigns_no_badge() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let mut art = case_pick_article(seeded.store_id, 4001, (400.0, 300.0, 200.0));
    // 销量 = 1.0 × palq: 满足落地（≥ 0.45）但不过徽章门槛（> 1.5）
    art.rssq = Some(100);
    art.palq = Some(100);
    art.ul_width = Some(1000.0);
    art.ul_length = Some(500.0);
    art.ul_height = Some(1000.0);
    let id = insert_article(&env, &art).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("non_opul"));
    assert_eq!(result.planned_count, 1);

    let article = load_article(&env, id).unwrap();
    assert!(article.plan_badge.is_none());
    let levels = aisle_levels(&env, seeded.aisle_id).unwrap();
    assert_eq!(levels[0].level_num, LevelNum::GROUND);
    assert_eq!(levels[0].level_height, 1127.0);
}

#[test]
fn test_multiple_location_badge_inflates_width() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let mut art = pallet_article(seeded.store_id, 5001, (1000.0, 500.0, 1000.0));
    // 200 > 100 × 1.5；500 × 2 > 900 → M，宽度 × ceil(2.0)
    art.rssq = Some(200);
    art.palq = Some(100);
    let id = insert_article(&env, &art).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("pallet"));
    assert_eq!(result.planned_count, 1);

    let article = load_article(&env, id).unwrap();
    assert_eq!(article.plan_badge.as_deref(), Some("M"));
    let placements = env.state.repos.placement_repo.list_by_article(id).unwrap();
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].width_used, 2000.0);

    let levels = aisle_levels(&env, seeded.aisle_id).unwrap();
    assert_eq!(levels[0].level_height, 1254.0);

    let badges = env.state.plan_api.article_badges(id).unwrap();
    assert_eq!(badges.csv, "M");
    assert_space_invariants(&env, &seeded, PlanningMode::Pallet);
}

#[test]
fn test_badge_gate_override_per_mode() {
    let env = create_test_env().unwrap();
    env.state
        .config_manager
        .set_global_config_value(&format!("{}/pallet", config_keys::BADGE_GATE_RATIO), "3.0")
        .unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let mut art = pallet_article(seeded.store_id, 5001, (1000.0, 500.0, 1000.0));
    art.rssq = Some(200);
    art.palq = Some(100);
    let id = insert_article(&env, &art).unwrap();

    env.state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("pallet"));

    let article = load_article(&env, id).unwrap();
    assert!(article.planned);
    assert!(article.plan_badge.is_none());
}

#[test]
fn test_scenario_rerun_is_idempotent() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 2).unwrap();
    insert_article(&env, &pallet_article(seeded.store_id, 1001, (1000.0, 500.0, 1200.0))).unwrap();
    for artno in 2001..2006 {
        insert_article(&env, &case_pick_article(seeded.store_id, artno, (700.0, 400.0, 250.0))).unwrap();
    }

    let request = PlanRequest::for_mode("non_opul");
    let first = env.state.plan_api.plan_aisle(seeded.aisle_id, &request);
    assert!(first.success, "{}", first.message);
    assert_eq!(first.planned_count, 6);
    let levels_before = aisle_levels(&env, seeded.aisle_id).unwrap();

    let second = env.state.plan_api.plan_aisle(seeded.aisle_id, &request);
    assert!(second.success);
    assert_eq!(second.planned_count, 0);
    assert_eq!(second.unplanned_count, 0);
    assert_eq!(aisle_levels(&env, seeded.aisle_id).unwrap(), levels_before);
    assert_space_invariants(&env, &seeded, PlanningMode::NonOpul);
}

#[test]
fn test_level_height_never_shrinks_across_runs() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let tall = insert_article(&env, &case_pick_article(seeded.store_id, 2001, (500.0, 400.0, 900.0))).unwrap();
    let request = PlanRequest::for_mode("non_opul");
    env.state.plan_api.plan_aisle(seeded.aisle_id, &request);

    let before = aisle_levels(&env, seeded.aisle_id).unwrap();
    assert_eq!(before[0].level_height, 1027.0);

    env.state.plan_api.unassign_article(tall).unwrap();
    let short = insert_article(&env, &case_pick_article(seeded.store_id, 2002, (500.0, 400.0, 100.0))).unwrap();
    let result = env.state.plan_api.plan_aisle(seeded.aisle_id, &request);
    // 先前商品已取消分配，两件都重新规划
    assert_eq!(result.planned_count, 2);

    let after = aisle_levels(&env, seeded.aisle_id).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, before[0].id);
    assert!(after[0].level_height >= before[0].level_height);
    assert_eq!(load_article(&env, short).unwrap().level_id, Some(before[0].id));
}

#[test]
fn test_existing_level_width_is_respected() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let request = PlanRequest::for_mode("non_opul");
    insert_article(&env, &case_pick_article(seeded.store_id, 2001, (2000.0, 400.0, 300.0))).unwrap();
    env.state.plan_api.plan_aisle(seeded.aisle_id, &request);

    // 01 层剩余 1000，新商品 1200 只能去 02 层
    let late = insert_article(&env, &case_pick_article(seeded.store_id, 2002, (1200.0, 400.0, 300.0))).unwrap();
    let result = env.state.plan_api.plan_aisle(seeded.aisle_id, &request);
    assert_eq!(result.planned_count, 1);

    let level = env
        .state
        .repos
        .level_repo
        .find_by_id(load_article(&env, late).unwrap().level_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(level.level_num, LevelNum(2));
    assert_space_invariants(&env, &seeded, PlanningMode::NonOpul);
}

#[test]
fn test_articles_with_missing_dimensions_are_skipped() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let mut broken = case_pick_article(seeded.store_id, 2001, (500.0, 400.0, 100.0));
    broken.cp_width = None;
    let id = insert_article(&env, &broken).unwrap();
    insert_article(&env, &case_pick_article(seeded.store_id, 2002, (500.0, 400.0, 100.0))).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("non_opul"));

    assert!(result.success);
    assert_eq!(result.planned_count, 1);
    assert_eq!(result.skipped_count, 1);
    assert!(!load_article(&env, id).unwrap().planned);
}

#[test]
fn test_too_deep_article_is_not_placed() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    insert_article(&env, &case_pick_article(seeded.store_id, 2001, (500.0, 1000.0, 100.0))).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("non_opul"));

    assert_eq!(result.planned_count, 0);
    assert_eq!(result.unplanned_count, 1);
}

#[test]
fn test_voss_mode_plans_case_picks_only() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let pallet = insert_article(&env, &pallet_article(seeded.store_id, 1001, (1000.0, 500.0, 1000.0))).unwrap();
    let case = insert_article(&env, &case_pick_article(seeded.store_id, 2001, (500.0, 400.0, 100.0))).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("voss"));

    assert_eq!(result.planned_count, 1);
    assert!(!load_article(&env, pallet).unwrap().planned);
    let case = load_article(&env, case).unwrap();
    assert!(case.planned);
    assert!(case.plan_badge.is_none());
}

#[test]
fn test_missing_and_invalid_mode_fail_without_writes() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let id = insert_article(&env, &pallet_article(seeded.store_id, 1001, (1000.0, 500.0, 1000.0))).unwrap();

    let missing = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::default());
    assert!(!missing.success);
    assert!(missing.message.contains("规划模式"));

    let invalid = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("teleport"));
    assert!(!invalid.success);
    assert_eq!(invalid.mode.as_deref(), Some("teleport"));

    assert!(!load_article(&env, id).unwrap().planned);
    assert!(aisle_levels(&env, seeded.aisle_id).unwrap().is_empty());
}

#[test]
fn test_unknown_aisle_is_reported_as_failure() {
    let env = create_test_env().unwrap();
    let result = env
        .state
        .plan_api
        .plan_aisle(999, &PlanRequest::for_mode("non_opul"));
    assert!(!result.success);
    assert!(result.message.contains("999"));
}

#[test]
fn test_plan_request_json_with_filters() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let mut lamp = case_pick_article(seeded.store_id, 2001, (500.0, 400.0, 100.0));
    lamp.name = Some("LAMPA".to_string());
    let lamp = insert_article(&env, &lamp).unwrap();
    let other = insert_article(&env, &case_pick_article(seeded.store_id, 2002, (500.0, 400.0, 100.0))).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle_json(seeded.aisle_id, r#"{"mode":"non_opul","name_prefix":"lam"}"#);

    assert!(result.success, "{}", result.message);
    assert_eq!(result.planned_count, 1);
    assert!(load_article(&env, lamp).unwrap().planned);
    assert!(!load_article(&env, other).unwrap().planned);

    let bad = env.state.plan_api.plan_aisle_json(seeded.aisle_id, "{not json");
    assert!(!bad.success);
}

#[test]
fn test_countertop_heavy_case_pick_lands_on_ground_with_case_pack_width() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let mut heavy = case_pick_article(seeded.store_id, 4001, (600.0, 400.0, 300.0));
    heavy.weight_g = Some(30_000.0);
    let heavy_id = insert_article(&env, &heavy).unwrap();
    let light_id = insert_article(&env, &case_pick_article(seeded.store_id, 4002, (500.0, 400.0, 200.0))).unwrap();

    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("countertop"));

    assert!(result.success, "{}", result.message);
    assert_eq!(result.mode.as_deref(), Some("countertop"));
    assert_eq!(result.planned_count, 2);

    let levels = aisle_levels(&env, seeded.aisle_id).unwrap();
    let ground = levels
        .iter()
        .find(|l| l.level_num == LevelNum::GROUND)
        .unwrap();
    // 箱拣高度 300 + 标准余量 127，无徽章
    assert_eq!(ground.level_height, 427.0);

    let heavy = load_article(&env, heavy_id).unwrap();
    assert_eq!(heavy.level_id, Some(ground.id));
    assert!(heavy.plan_badge.is_none());
    let placements = level_placements(&env, ground.id).unwrap();
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].width_used, 600.0);

    let light = load_article(&env, light_id).unwrap();
    assert_ne!(light.level_id, Some(ground.id));
    assert_space_invariants(&env, &seeded, PlanningMode::Countertop);
}

#[test]
fn test_existing_level_height_survives_mode_change() {
    let env = create_test_env().unwrap();
    let seeded = seed_aisle(&env, 1, 3000.0, 900.0, 2000.0, 1).unwrap();
    let mut opul = case_pick_article(seeded.store_id, 3001, (400.0, 300.0, 200.0));
    opul.sales_method = Some("opul".to_string());
    opul.ul_width = Some(800.0);
    opul.ul_length = Some(600.0);
    opul.ul_height = Some(900.0);
    let opul_id = insert_article(&env, &opul).unwrap();
    env.state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("opul"));
    let level_id = load_article(&env, opul_id).unwrap().level_id.unwrap();

    // 落位时记录整托高度，而非箱拣高度
    let placement_repo = &env.state.repos.placement_repo;
    assert_eq!(placement_repo.max_height_by_level(level_id).unwrap(), 900.0);

    let id = insert_article(&env, &case_pick_article(seeded.store_id, 2001, (400.0, 300.0, 200.0))).unwrap();
    let result = env
        .state
        .plan_api
        .plan_aisle(seeded.aisle_id, &PlanRequest::for_mode("non_opul"));
    assert_eq!(result.planned_count, 1);

    let article = load_article(&env, id).unwrap();
    assert_eq!(article.level_id, Some(level_id));
    let placements = level_placements(&env, level_id).unwrap();
    let heights: Vec<f64> = placements.iter().map(|p| p.height_used).collect();
    assert_eq!(heights, vec![900.0, 200.0]);
    assert_eq!(placement_repo.max_height_by_level(level_id).unwrap(), 900.0);

    let level = env
        .state
        .repos
        .level_repo
        .find_by_id(level_id)
        .unwrap()
        .unwrap();
    assert_eq!(level.level_height, 1154.0);
}
