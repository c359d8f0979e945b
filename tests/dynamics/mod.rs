mod nbody;
